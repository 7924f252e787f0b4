//! RPC handlers for the mining contract.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{extract::State, Json};
use num_traits::ToPrimitive;
use palladium_consensus::{Block, BlockHeader, Decodable, Script};
use palladium_mining::{
    check_proposal, generate_blocks, submit_block, submit_header, TemplateRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Default trailing window for the hashrate estimate.
const HASHPS_DEFAULT_LOOKUP: usize = 720;

/// POST /mining/template
///
/// BIP22 `getblocktemplate`: returns the next block template, or in
/// proposal mode validates a serialized candidate without connecting
/// it. Long polling blocks until the tip or the pool moves on.
pub async fn get_block_template(
    State(state): State<AppState>,
    Json(request): Json<TemplateRequest>,
) -> ApiResult<Json<Value>> {
    match request.mode.as_deref() {
        Some("proposal") => {
            let data = request.data.as_ref().ok_or_else(|| {
                ApiError::BadRequest("missing data string key for proposal".to_string())
            })?;
            let block = decode_block_hex(data)?;
            let reply = check_proposal(&state.chain, &block);
            Ok(Json(option_reply(reply.bip22())))
        }
        None | Some("template") => {
            let template = state.templates.template(&request).await?;
            let value = serde_json::to_value(template)
                .map_err(|err| ApiError::Internal(err.to_string()))?;
            Ok(Json(value))
        }
        Some(other) => Err(ApiError::InvalidParameter(format!("invalid mode '{}'", other))),
    }
}

/// Block submission body.
#[derive(Debug, Deserialize)]
pub struct SubmitBlockRequest {
    /// Hex-encoded block.
    pub hexdata: String,
}

/// POST /mining/submitblock
///
/// Returns JSON null when the block was accepted, a BIP22 reply
/// string otherwise.
pub async fn post_submit_block(
    State(state): State<AppState>,
    Json(request): Json<SubmitBlockRequest>,
) -> ApiResult<Json<Value>> {
    let block = decode_block_hex(&request.hexdata)?;
    debug!(hash = %block.hash(), "submitblock");
    let reply = submit_block(&state.chain, &state.signal, &block);
    Ok(Json(option_reply(reply.bip22())))
}

/// Header submission body.
#[derive(Debug, Deserialize)]
pub struct SubmitHeaderRequest {
    /// Hex-encoded 80-byte header.
    pub hexdata: String,
}

/// POST /mining/submitheader
///
/// Accepts a bare header as a candidate chain tip; only valid below
/// the AuxPoW fork height.
pub async fn post_submit_header(
    State(state): State<AppState>,
    Json(request): Json<SubmitHeaderRequest>,
) -> ApiResult<Json<Value>> {
    let bytes = hex::decode(&request.hexdata)
        .map_err(|_| ApiError::Deserialization("block header decode failed".to_string()))?;
    let header = BlockHeader::decode(&bytes)
        .map_err(|_| ApiError::Deserialization("block header decode failed".to_string()))?;
    submit_header(&state.chain, &header)?;
    Ok(Json(Value::Null))
}

/// Mining info payload.
#[derive(Debug, Serialize)]
pub struct MiningInfo {
    pub blocks: i32,
    pub difficulty: f64,
    pub networkhashps: f64,
    pub pooledtx: usize,
    pub chain: String,
}

/// GET /mining/info
pub async fn get_mining_info(State(state): State<AppState>) -> ApiResult<Json<MiningInfo>> {
    let chain = state.chain.read();
    let info = MiningInfo {
        blocks: chain.height(),
        difficulty: difficulty_from_bits(chain.tip_bits()),
        networkhashps: network_hash_per_second(&chain, HASHPS_DEFAULT_LOOKUP),
        pooledtx: state.pool.read().len(),
        chain: chain.params().network.as_str().to_string(),
    };
    Ok(Json(info))
}

/// Generation request; regtest only.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub nblocks: usize,
    /// Hex scriptPubKey the coinbases pay to.
    pub script: String,
    pub maxtries: Option<u64>,
}

/// POST /mining/generate
pub async fn post_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<Vec<String>>> {
    let script_bytes = hex::decode(&request.script)
        .map_err(|_| ApiError::BadRequest("invalid script hex".to_string()))?;
    let script = Script::from_bytes(script_bytes);
    let max_tries = request.maxtries.unwrap_or(1_000_000);

    let mut extra_nonce = state.extra_nonce.lock();
    let hashes = generate_blocks(
        &state.chain,
        &state.pool,
        &state.signal,
        script,
        request.nblocks,
        max_tries,
        &mut extra_nonce,
    )?;
    Ok(Json(hashes.iter().map(|hash| hash.to_string()).collect()))
}

fn decode_block_hex(data: &str) -> ApiResult<Block> {
    let bytes = hex::decode(data)
        .map_err(|_| ApiError::Deserialization("block decode failed".to_string()))?;
    Block::decode(&bytes).map_err(|_| ApiError::Deserialization("block decode failed".to_string()))
}

fn option_reply(reply: Option<String>) -> Value {
    match reply {
        Some(text) => Value::String(text),
        None => Value::Null,
    }
}

/// Display difficulty relative to the minimum-difficulty target.
///
/// Reporting only; consensus code never touches floats.
fn difficulty_from_bits(bits: u32) -> f64 {
    let mut shift = ((bits >> 24) & 0xff) as i32;
    let mantissa = (bits & 0x00ff_ffff) as f64;
    if mantissa == 0.0 {
        return 0.0;
    }
    let mut difficulty = 65_535.0 / mantissa;
    while shift < 29 {
        difficulty *= 256.0;
        shift += 1;
    }
    while shift > 29 {
        difficulty /= 256.0;
        shift -= 1;
    }
    difficulty
}

/// Average hashes per second over the trailing window.
fn network_hash_per_second(chain: &palladium_chain::ChainState, lookup: usize) -> f64 {
    match chain.work_window(lookup) {
        Some((work, min_time, max_time)) if max_time > min_time => {
            let work = work.to_f64().unwrap_or(0.0);
            work / f64::from(max_time - min_time)
        }
        _ => 0.0,
    }
}
