//! Block template construction and long polling.

use crate::error::{MiningError, MiningResult};
use crate::pool::TxPool;
use crate::signal::TipSignal;
use crate::{MAX_BLOCK_SIGOPS_COST, MAX_BLOCK_WEIGHT, MAX_TEMPLATE_TRANSACTIONS, WITNESS_SCALE_FACTOR};
use palladium_chain::ChainState;
use palladium_consensus::{
    block_subsidy, decode_compact, Deployment, DeploymentPos, Encodable, AUXPOW_CHAIN_ID,
    AUXPOW_MAGIC, AUXPOW_VERSION_BIT, BASE_VERSION, H256,
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// How long a cached template survives pool churn.
const TEMPLATE_REFRESH_SECS: u64 = 5;

/// Primary long-poll deadline.
const LONGPOLL_PRIMARY_SECS: u64 = 60;

/// Retry window after the primary deadline expires.
const LONGPOLL_RETRY_SECS: u64 = 10;

/// A `getblocktemplate` request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateRequest {
    /// "template" (default) or "proposal".
    pub mode: Option<String>,
    /// Softfork rules the client understands.
    #[serde(default)]
    pub rules: Vec<String>,
    /// Long-poll id from a previous template.
    pub longpollid: Option<String>,
    /// Hex block for proposal mode.
    pub data: Option<String>,
}

/// One non-coinbase transaction in a template.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateTransaction {
    /// Full serialized transaction, hex.
    pub data: String,
    pub txid: String,
    pub hash: String,
    /// 1-based indices of in-template ancestors.
    pub depends: Vec<usize>,
    pub fee: i64,
    pub sigops: i64,
    pub weight: i64,
}

/// Merge-mining fields of a template.
#[derive(Debug, Clone, Serialize)]
pub struct AuxTemplate {
    /// Commitment magic, hex.
    pub flags: String,
    pub chainid: i64,
}

/// A BIP22-shaped block template.
#[derive(Debug, Clone, Serialize)]
pub struct BlockTemplate {
    pub capabilities: Vec<String>,
    pub version: i32,
    pub rules: Vec<String>,
    pub vbavailable: BTreeMap<String, u8>,
    pub vbrequired: u32,
    pub previousblockhash: String,
    pub transactions: Vec<TemplateTransaction>,
    pub coinbaseaux: BTreeMap<String, String>,
    pub coinbasevalue: i64,
    pub longpollid: String,
    pub target: String,
    pub mintime: i64,
    pub mutable: Vec<String>,
    pub noncerange: String,
    pub sigoplimit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizelimit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weightlimit: Option<i64>,
    pub curtime: i64,
    pub bits: String,
    pub height: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux: Option<AuxTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitold: Option<bool>,
}

struct TemplateCache {
    tip: H256,
    pool_updates: u64,
    built_at: SystemTime,
    template: BlockTemplate,
}

/// Builds and caches block templates for external miners.
pub struct TemplateBuilder {
    chain: Arc<RwLock<ChainState>>,
    pool: Arc<RwLock<TxPool>>,
    signal: Arc<TipSignal>,
    cache: Mutex<Option<TemplateCache>>,
}

impl TemplateBuilder {
    pub fn new(
        chain: Arc<RwLock<ChainState>>,
        pool: Arc<RwLock<TxPool>>,
        signal: Arc<TipSignal>,
    ) -> Self {
        TemplateBuilder {
            chain,
            pool,
            signal,
            cache: Mutex::new(None),
        }
    }

    /// Serve a template request, honoring its long poll.
    pub async fn template(&self, request: &TemplateRequest) -> MiningResult<BlockTemplate> {
        if !request.rules.iter().any(|rule| rule == "segwit") {
            return Err(MiningError::InvalidRequest(
                "getblocktemplate must be called with the \"segwit\" rule set".to_string(),
            ));
        }
        if let Some(longpollid) = &request.longpollid {
            self.wait_for_update(longpollid).await?;
        }
        if self.signal.shutdown_requested() {
            return Err(MiningError::ShuttingDown);
        }
        Ok(self.current())
    }

    /// The current template, rebuilt when the tip moved or the pool
    /// changed and the cached copy has aged out.
    pub fn current(&self) -> BlockTemplate {
        let chain = self.chain.read();
        let pool = self.pool.read();
        let tip = chain.tip_hash();
        let pool_updates = pool.updates();

        let mut cache = self.cache.lock();
        if let Some(cached) = cache.as_ref() {
            let fresh = cached.pool_updates == pool_updates
                || cached
                    .built_at
                    .elapsed()
                    .map(|age| age < Duration::from_secs(TEMPLATE_REFRESH_SECS))
                    .unwrap_or(false);
            if cached.tip == tip && fresh {
                return cached.template.clone();
            }
        }

        let template = build_template(&chain, &pool);
        *cache = Some(TemplateCache {
            tip,
            pool_updates,
            built_at: SystemTime::now(),
            template: template.clone(),
        });
        template
    }

    /// Drop the cached template, forcing the next call to rebuild.
    pub fn invalidate(&self) {
        *self.cache.lock() = None;
    }

    /// Block until the chain tip moves away from the long-polled one,
    /// the pool sees updates after the primary deadline, or shutdown.
    pub async fn wait_for_update(&self, longpollid: &str) -> MiningResult<()> {
        let (watched_tip, watched_updates) = parse_longpollid(longpollid)?;
        debug!(%watched_tip, watched_updates, "long poll started");

        let mut deadline =
            tokio::time::Instant::now() + Duration::from_secs(LONGPOLL_PRIMARY_SECS);
        loop {
            if self.signal.shutdown_requested() {
                return Err(MiningError::ShuttingDown);
            }
            if self.chain.read().tip_hash() != watched_tip {
                debug!("long poll released by tip change");
                return Ok(());
            }
            match tokio::time::timeout_at(deadline, self.signal.wait()).await {
                Ok(()) => {}
                Err(_) => {
                    if self.pool.read().updates() != watched_updates {
                        debug!("long poll released by pool activity");
                        return Ok(());
                    }
                    deadline += Duration::from_secs(LONGPOLL_RETRY_SECS);
                }
            }
        }
    }
}

fn build_template(chain: &ChainState, pool: &TxPool) -> BlockTemplate {
    let params = chain.params();
    let height = chain.height() + 1;
    let auxpow_active = params.consensus.auxpow_active(height);

    let mintime = i64::from(chain.tip_median_time_past()) + 1;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_secs() as i64)
        .unwrap_or(mintime);
    let curtime = now.max(mintime);

    let bits = chain.next_work_required(curtime as u32);
    let (target, _, _) = decode_compact(bits);

    let mut version = BASE_VERSION;
    if auxpow_active {
        version |= AUXPOW_VERSION_BIT;
    }

    let mut rules = Vec::new();
    if params.consensus.csv_height <= height {
        rules.push("csv".to_string());
    }
    let segwit_active = params.consensus.segwit_height <= height;
    if segwit_active {
        rules.push("segwit".to_string());
    }

    let tip_median = chain.tip_median_time_past() as i64;
    let mut vbavailable = BTreeMap::new();
    for pos in DeploymentPos::ALL {
        let deployment = params.consensus.deployment(pos);
        if deployment.start_time == Deployment::ALWAYS_ACTIVE {
            continue;
        }
        if tip_median >= deployment.start_time && tip_median < deployment.timeout {
            vbavailable.insert(pos.name().to_string(), deployment.bit);
        }
    }

    let entries = pool.by_fee(MAX_TEMPLATE_TRANSACTIONS);
    let mut positions: HashMap<H256, usize> = HashMap::new();
    for (i, entry) in entries.iter().enumerate() {
        positions.insert(entry.txid, i + 1);
    }
    let mut transactions = Vec::with_capacity(entries.len());
    let mut total_fees = 0i64;
    for entry in &entries {
        total_fees += entry.fee;
        let depends = entry
            .tx
            .inputs
            .iter()
            .filter_map(|input| positions.get(&input.prevout.txid).copied())
            .collect();
        transactions.push(TemplateTransaction {
            data: hex::encode(entry.tx.encode()),
            txid: entry.txid.to_string(),
            hash: entry.txid.to_string(),
            depends,
            fee: entry.fee,
            sigops: entry.sigops,
            weight: entry.weight,
        });
    }

    let (sigoplimit, sizelimit, weightlimit) = if segwit_active {
        (MAX_BLOCK_SIGOPS_COST, None, Some(MAX_BLOCK_WEIGHT))
    } else {
        (
            MAX_BLOCK_SIGOPS_COST / WITNESS_SCALE_FACTOR,
            Some(MAX_BLOCK_WEIGHT),
            None,
        )
    };

    let (aux, submitold) = if auxpow_active {
        info!(height, "auxpow active, template carries aux fields");
        (
            Some(AuxTemplate {
                flags: hex::encode(AUXPOW_MAGIC),
                chainid: i64::from(AUXPOW_CHAIN_ID),
            }),
            Some(false),
        )
    } else {
        (None, None)
    };

    BlockTemplate {
        capabilities: vec!["proposal".to_string()],
        version,
        rules,
        vbavailable,
        vbrequired: 0,
        previousblockhash: chain.tip_hash().to_string(),
        transactions,
        coinbaseaux: BTreeMap::new(),
        coinbasevalue: block_subsidy(height, &params.consensus) + total_fees,
        longpollid: format!("{}{}", chain.tip_hash(), pool.updates()),
        target: format!("{:064x}", target),
        mintime,
        mutable: vec![
            "time".to_string(),
            "transactions".to_string(),
            "prevblock".to_string(),
        ],
        noncerange: "00000000ffffffff".to_string(),
        sigoplimit,
        sizelimit,
        weightlimit,
        curtime,
        bits: format!("{:08x}", bits),
        height,
        aux,
        submitold,
    }
}

/// Split a `<tip hash hex><pool counter>` long-poll id.
fn parse_longpollid(longpollid: &str) -> MiningResult<(H256, u64)> {
    if longpollid.len() <= 64 || !longpollid.is_char_boundary(64) {
        return Err(MiningError::InvalidLongPollId(longpollid.to_string()));
    }
    let (hash_part, counter_part) = longpollid.split_at(64);
    if !hash_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MiningError::InvalidLongPollId(longpollid.to_string()));
    }
    let tip = H256::from_str(hash_part)
        .map_err(|_| MiningError::InvalidLongPollId(longpollid.to_string()))?;
    let updates: u64 = counter_part
        .parse()
        .map_err(|_| MiningError::InvalidLongPollId(longpollid.to_string()))?;
    Ok((tip, updates))
}
