//! Chain parameters for the Palladium networks.
//!
//! Three networks share one parameter record and differ only in
//! constants: main, test and regtest. Parameters are built once at
//! startup from a network name and are immutable afterwards; a
//! process-wide selection is available through [`select_params`] /
//! [`params`], while tests construct records directly.

use crate::block::Block;
use crate::difficulty::LWMA_ACTIVATION_HEIGHT;
use crate::hash::H256;
use crate::script::{Script, OP_CHECKSIG};
use crate::transaction::{Transaction, TxIn, TxOut};
use num_bigint::BigUint;
use num_traits::One;
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// One coin in base units.
pub const COIN: i64 = 100_000_000;

/// Sentinel height for deployments that never activate.
pub const MAX_BLOCK_HEIGHT: i32 = i32::MAX;

/// The coinbase message of the shared genesis block.
const GENESIS_TIMESTAMP: &[u8] =
    b"The Times 03/Jan/2009 Chancellor on brink of second bailout for banks";

/// Uncompressed key paid by the genesis coinbase.
const GENESIS_OUTPUT_KEY: &str = "04678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5f";

/// Network identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Main,
    Test,
    Regtest,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Main => "main",
            Network::Test => "test",
            Network::Regtest => "regtest",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ChainParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" | "mainnet" => Ok(Network::Main),
            "test" | "testnet" => Ok(Network::Test),
            "regtest" => Ok(Network::Regtest),
            other => Err(ChainParamsError {
                field: "network",
                message: format!("unknown chain '{}'", other),
            }),
        }
    }
}

/// Error constructing chain parameters from configuration.
#[derive(Debug, Clone, Error)]
#[error("chain params error for '{field}': {message}")]
pub struct ChainParamsError {
    pub field: &'static str,
    pub message: String,
}

/// Version-bits deployment positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentPos {
    TestDummy,
}

impl DeploymentPos {
    pub const ALL: [DeploymentPos; 1] = [DeploymentPos::TestDummy];

    pub fn name(&self) -> &'static str {
        match self {
            DeploymentPos::TestDummy => "testdummy",
        }
    }
}

/// A BIP9 deployment schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    /// Bit position in the block version.
    pub bit: u8,
    /// Median-time start for signalling.
    pub start_time: i64,
    /// Median-time timeout for signalling.
    pub timeout: i64,
}

impl Deployment {
    /// Timeout value meaning the deployment never expires.
    pub const NO_TIMEOUT: i64 = i64::MAX;

    /// Start value meaning the deployment is always active.
    pub const ALWAYS_ACTIVE: i64 = -1;
}

/// Parameters that influence chain consensus.
#[derive(Debug, Clone)]
pub struct ConsensusParams {
    pub genesis_hash: H256,
    pub subsidy_halving_interval: i32,
    /// Genesis hash when P2SH was active from the start; unused when
    /// the height-based activations below apply.
    pub bip16_exception: H256,
    pub bip34_height: i32,
    /// Stale hash-keyed activation; the height above is authoritative.
    pub bip34_hash: H256,
    pub bip65_height: i32,
    pub bip66_height: i32,
    pub csv_height: i32,
    pub segwit_height: i32,
    /// No unknown-versionbits warnings below this height.
    pub min_bip9_warning_height: i32,
    pub rule_change_activation_threshold: u32,
    pub miner_confirmation_window: u32,
    pub deployments: [Deployment; DeploymentPos::ALL.len()],
    pub pow_limit: BigUint,
    pub allow_min_difficulty_blocks: bool,
    pub pow_no_retargeting: bool,
    /// Target spacing below the LWMA switch, seconds.
    pub pow_target_spacing: i64,
    /// Target spacing from the LWMA switch on, seconds.
    pub pow_target_spacing_v2: i64,
    pub pow_target_timespan: i64,
    pub minimum_chain_work: BigUint,
    pub assume_valid: H256,
    /// Height at which auxiliary proof-of-work becomes mandatory.
    pub auxpow_start_height: i32,
}

impl ConsensusParams {
    /// Blocks per legacy retarget interval at the given height.
    ///
    /// Only the pre-LWMA branch is consulted by production paths; the
    /// LWMA engine ignores the interval entirely.
    pub fn adjustment_interval(&self, height: i32) -> i64 {
        if height < LWMA_ACTIVATION_HEIGHT {
            self.pow_target_timespan / self.pow_target_spacing
        } else {
            self.pow_target_timespan / self.pow_target_spacing_v2
        }
    }

    /// Whether blocks at `height` must carry auxiliary proof-of-work.
    pub fn auxpow_active(&self, height: i32) -> bool {
        height >= self.auxpow_start_height
    }

    pub fn deployment(&self, pos: DeploymentPos) -> &Deployment {
        &self.deployments[pos as usize]
    }
}

/// Overrides applied to the regtest parameter set at startup.
#[derive(Debug, Clone, Default)]
pub struct RegtestOverrides {
    /// Segwit activation height; `-1` disables activation entirely.
    pub segwit_height: Option<i64>,
    /// AuxPoW activation height; `-1` keeps the fork disabled.
    pub auxpow_start_height: Option<i64>,
    /// `name:start:timeout` deployment schedules.
    pub vbparams: Vec<String>,
}

/// Immutable per-network parameter record.
#[derive(Debug, Clone)]
pub struct ChainParams {
    pub network: Network,
    pub consensus: ConsensusParams,
    /// P2P message-start magic.
    pub message_start: [u8; 4],
    pub default_port: u16,
    pub dns_seeds: Vec<&'static str>,
    pub fixed_seeds: Vec<&'static str>,
    pub base58_pubkey_prefix: u8,
    pub base58_script_prefix: u8,
    pub base58_secret_prefix: u8,
    pub bip32_pubkey_prefix: [u8; 4],
    pub bip32_secret_prefix: [u8; 4],
    pub bech32_hrp: &'static str,
    pub genesis: Block,
    pub checkpoints: BTreeMap<i32, H256>,
    pub require_standard: bool,
    pub is_test_chain: bool,
    /// Whether blocks may be generated on demand (regtest).
    pub mine_blocks_on_demand: bool,
}

impl ChainParams {
    /// Main network parameters.
    pub fn main() -> Self {
        let genesis = create_genesis_block(1231006505, 2083236893, 0x1d00ffff, 1, 50 * COIN);
        let genesis_hash = genesis.hash();
        assert_eq!(
            genesis_hash,
            h256("0x000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"),
            "main genesis hash"
        );
        assert_eq!(
            genesis.header.merkle_root,
            h256("0x4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"),
            "main genesis merkle root"
        );

        let consensus = ConsensusParams {
            genesis_hash,
            subsidy_halving_interval: 210_000,
            bip16_exception: genesis_hash,
            bip34_height: 29_000,
            bip34_hash: H256::ZERO,
            bip65_height: 29_000,
            bip66_height: 29_000,
            csv_height: 29_000,
            segwit_height: 29_000,
            // segwit activation height + miner confirmation window
            min_bip9_warning_height: 29_540,
            rule_change_activation_threshold: 720,
            miner_confirmation_window: 540,
            deployments: [Deployment {
                bit: 28,
                start_time: 1_199_145_601,
                timeout: 1_230_767_999,
            }],
            pow_limit: (BigUint::one() << 224u32) - BigUint::one(),
            allow_min_difficulty_blocks: false,
            pow_no_retargeting: false,
            pow_target_spacing: 10 * 60,
            pow_target_spacing_v2: 2 * 60,
            pow_target_timespan: 24 * 60 * 60,
            minimum_chain_work: BigUint::parse_bytes(
                b"00000000000000000000000000000000000000000000009a5fd670f7a9ae6f2e",
                16,
            )
            .expect("valid chain work hex"),
            assume_valid: h256(
                "0x000000000000174621a036477c7edff5648052fa268133658561e9ca840831be",
            ),
            auxpow_start_height: 310_000,
        };

        ChainParams {
            network: Network::Main,
            consensus,
            message_start: [0xfa, 0xc7, 0xb2, 0xda],
            default_port: 2333,
            dns_seeds: vec![
                "dnsseed.palladium-coin.store",
                "dnsseed.palladium-coin.com",
                "dnsseed.palladium-coin.net",
                "dnsseed.palladium-coin.org",
                "dnsseed.palladium-coin.xyz",
                "dnsseed.palladium-coin.de",
                "dnsseed.palladiumblockchain.net",
            ],
            fixed_seeds: Vec::new(),
            base58_pubkey_prefix: 55,
            base58_script_prefix: 5,
            base58_secret_prefix: 128,
            bip32_pubkey_prefix: [0x04, 0x88, 0xb2, 0x1e],
            bip32_secret_prefix: [0x04, 0x88, 0xad, 0xe4],
            bech32_hrp: "plm",
            genesis,
            checkpoints: checkpoint_table(&[
                (0, "0x000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"),
                (1, "0x00000000082962e4c2838933cb63507142c1abb748d84b7ddce6bb233d6407e0"),
                (16, "0x000000004cc3eca82841f0691e6231b86c3b269e447fa7d6e7221cd42f725390"),
                (69, "0x00000000ae75d0169080e9f0ddbcd80827eda623cfe1f4a2b1be6dcd49b916e6"),
                (22_170, "0x000000000000086425f826a2eb60c588aefd3e0783ddeccf0f4f0c985d348e69"),
                (26_619, "0x00000000000000d66df607146de7d9b423cf97150beb804d22439d199e868ca9"),
                (28_879, "0x0000000000000017e9e74b9b403b775098905418b1333e9612f510af66746aa7"),
                (28_925, "0x0000000000000014351dee34029945d5a4dea299ec8843626695c88b084b4d10"),
                (50_000, "0x000000000000041fddecba51204a679b15ae47fc8aa658ef4ea7b953445d95e5"),
                (100_000, "0x0000000000000850eba93bbc491f085e2c79c0c30c497292858c72e90cae69a5"),
                (142_892, "0x000000000000829a0a4cab2f040151766df64edfe8817c565d101ae12b51411a"),
                (150_000, "0x00000000000003212d753a62f2dec5b696ab22524cc49ba7cdc0d80c45d0eb18"),
                (200_000, "0x000000000000221a9e16556453fc86308b260d95d80c14bafaf053a09374e7eb"),
                (250_000, "0x0000000000012553b0303deaf5f2883deb66c901b6848dd03bb4a34f1774e0d0"),
                (300_000, "0x0000000000013acdf07a4fb988bbe9824c36eb421478a71c8196cf524dcba143"),
                (308_500, "0x000000000000693c6a323a828918f994abae9473373285aa22f0ec71fb5d0f39"),
            ]),
            require_standard: true,
            is_test_chain: false,
            mine_blocks_on_demand: false,
        }
    }

    /// Test network parameters.
    pub fn test() -> Self {
        let genesis = create_genesis_block(1296688602, 414098458, 0x1d00ffff, 1, 50 * COIN);
        let genesis_hash = genesis.hash();
        assert_eq!(
            genesis_hash,
            h256("0x000000000933ea01ad0ee984209779baaec3ced90fa3f408719526f8d77f4943"),
            "test genesis hash"
        );
        assert_eq!(
            genesis.header.merkle_root,
            h256("0x4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"),
            "test genesis merkle root"
        );

        let consensus = ConsensusParams {
            genesis_hash,
            subsidy_halving_interval: 210_000,
            bip16_exception: H256::ZERO,
            bip34_height: 0,
            bip34_hash: H256::ZERO,
            bip65_height: 0,
            bip66_height: 0,
            csv_height: 0,
            segwit_height: 0,
            min_bip9_warning_height: 0,
            rule_change_activation_threshold: 720,
            miner_confirmation_window: 540,
            deployments: [Deployment {
                bit: 28,
                start_time: 0,
                timeout: Deployment::NO_TIMEOUT,
            }],
            pow_limit: (BigUint::one() << 224u32) - BigUint::one(),
            allow_min_difficulty_blocks: true,
            pow_no_retargeting: false,
            pow_target_spacing: 2 * 60,
            pow_target_spacing_v2: 2 * 60,
            pow_target_timespan: 24 * 60 * 60,
            minimum_chain_work: BigUint::default(),
            assume_valid: H256::ZERO,
            auxpow_start_height: 2_016,
        };

        ChainParams {
            network: Network::Test,
            consensus,
            message_start: [0x0b, 0x11, 0x09, 0x07],
            default_port: 12_333,
            dns_seeds: Vec::new(),
            fixed_seeds: Vec::new(),
            base58_pubkey_prefix: 127,
            base58_script_prefix: 115,
            base58_secret_prefix: 255,
            bip32_pubkey_prefix: [0x04, 0x35, 0x87, 0xcf],
            bip32_secret_prefix: [0x04, 0x35, 0x83, 0x94],
            bech32_hrp: "tplm",
            genesis,
            checkpoints: checkpoint_table(&[(
                0,
                "0x000000000933ea01ad0ee984209779baaec3ced90fa3f408719526f8d77f4943",
            )]),
            require_standard: false,
            is_test_chain: true,
            mine_blocks_on_demand: false,
        }
    }

    /// Regression-test parameters with startup overrides applied.
    pub fn regtest(overrides: &RegtestOverrides) -> Result<Self, ChainParamsError> {
        let genesis = create_genesis_block(1296688602, 2, 0x207fffff, 1, 50 * COIN);
        let genesis_hash = genesis.hash();
        assert_eq!(
            genesis_hash,
            h256("0x0f9188f13cb7b2c71f2a335e3a4fc328bf5beb436012afca590b1a11466e2206"),
            "regtest genesis hash"
        );
        assert_eq!(
            genesis.header.merkle_root,
            h256("0x4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"),
            "regtest genesis merkle root"
        );

        let mut consensus = ConsensusParams {
            genesis_hash,
            subsidy_halving_interval: 150,
            bip16_exception: H256::ZERO,
            bip34_height: 0,
            bip34_hash: H256::ZERO,
            bip65_height: 0,
            bip66_height: 0,
            csv_height: 0,
            segwit_height: 0,
            min_bip9_warning_height: 0,
            rule_change_activation_threshold: 108,
            miner_confirmation_window: 144,
            deployments: [Deployment {
                bit: 28,
                start_time: 0,
                timeout: Deployment::NO_TIMEOUT,
            }],
            pow_limit: (BigUint::one() << 255u32) - BigUint::one(),
            allow_min_difficulty_blocks: true,
            pow_no_retargeting: true,
            pow_target_spacing: 2 * 60,
            pow_target_spacing_v2: 2 * 60,
            pow_target_timespan: 24 * 60 * 60,
            minimum_chain_work: BigUint::default(),
            assume_valid: H256::ZERO,
            auxpow_start_height: MAX_BLOCK_HEIGHT,
        };

        apply_regtest_overrides(&mut consensus, overrides)?;

        Ok(ChainParams {
            network: Network::Regtest,
            consensus,
            message_start: [0xfa, 0xbf, 0xb5, 0xda],
            default_port: 28_444,
            dns_seeds: Vec::new(),
            fixed_seeds: Vec::new(),
            base58_pubkey_prefix: 127,
            base58_script_prefix: 115,
            base58_secret_prefix: 255,
            bip32_pubkey_prefix: [0x04, 0x35, 0x87, 0xcf],
            bip32_secret_prefix: [0x04, 0x35, 0x83, 0x94],
            bech32_hrp: "rplm",
            genesis,
            checkpoints: checkpoint_table(&[(
                0,
                "0x0f9188f13cb7b2c71f2a335e3a4fc328bf5beb436012afca590b1a11466e2206",
            )]),
            require_standard: true,
            is_test_chain: true,
            mine_blocks_on_demand: true,
        })
    }

    /// Build parameters for a named network.
    pub fn for_network(
        network: Network,
        overrides: &RegtestOverrides,
    ) -> Result<Self, ChainParamsError> {
        match network {
            Network::Main => Ok(ChainParams::main()),
            Network::Test => Ok(ChainParams::test()),
            Network::Regtest => ChainParams::regtest(overrides),
        }
    }
}

fn apply_regtest_overrides(
    consensus: &mut ConsensusParams,
    overrides: &RegtestOverrides,
) -> Result<(), ChainParamsError> {
    if let Some(height) = overrides.segwit_height {
        consensus.segwit_height = parse_activation_height("segwitheight", height)?;
    }
    if let Some(height) = overrides.auxpow_start_height {
        consensus.auxpow_start_height = parse_activation_height("auxpowstartheight", height)?;
    }

    for schedule in &overrides.vbparams {
        let parts: Vec<&str> = schedule.split(':').collect();
        if parts.len() != 3 {
            return Err(ChainParamsError {
                field: "vbparams",
                message: "version bits parameters malformed, expecting deployment:start:end"
                    .to_string(),
            });
        }
        let start_time: i64 = parts[1].parse().map_err(|_| ChainParamsError {
            field: "vbparams",
            message: format!("invalid start time ({})", parts[1]),
        })?;
        let timeout: i64 = parts[2].parse().map_err(|_| ChainParamsError {
            field: "vbparams",
            message: format!("invalid timeout ({})", parts[2]),
        })?;
        let pos = DeploymentPos::ALL
            .iter()
            .find(|pos| pos.name() == parts[0])
            .copied()
            .ok_or_else(|| ChainParamsError {
                field: "vbparams",
                message: format!("invalid deployment ({})", parts[0]),
            })?;
        let deployment = &mut consensus.deployments[pos as usize];
        deployment.start_time = start_time;
        deployment.timeout = timeout;
        info!(
            deployment = pos.name(),
            start_time, timeout, "version bits parameters overridden"
        );
    }
    Ok(())
}

/// Validate an `-<name>height` argument; `-1` means "never".
fn parse_activation_height(field: &'static str, height: i64) -> Result<i32, ChainParamsError> {
    if height < -1 || height >= i64::from(MAX_BLOCK_HEIGHT) {
        return Err(ChainParamsError {
            field,
            message: format!(
                "activation height {} is out of valid range, use -1 to disable",
                height
            ),
        });
    }
    if height == -1 {
        info!(field, "activation disabled for testing");
        return Ok(MAX_BLOCK_HEIGHT);
    }
    Ok(height as i32)
}

/// Block subsidy at a height, halving on the network schedule.
pub fn block_subsidy(height: i32, params: &ConsensusParams) -> i64 {
    let halvings = height / params.subsidy_halving_interval;
    if halvings >= 64 {
        return 0;
    }
    (50 * COIN) >> halvings
}

fn create_genesis_block(time: u32, nonce: u32, bits: u32, version: i32, reward: i64) -> Block {
    let output_key = hex::decode(GENESIS_OUTPUT_KEY).expect("valid genesis key hex");

    let mut script_sig = Script::new();
    script_sig.push_scriptnum(486_604_799);
    script_sig.push_scriptnum(4);
    script_sig.push_slice(GENESIS_TIMESTAMP);

    let mut script_pubkey = Script::new();
    script_pubkey.push_slice(&output_key);
    script_pubkey.push_opcode(OP_CHECKSIG);

    let tx = Transaction {
        version: 1,
        inputs: vec![TxIn::coinbase(script_sig)],
        outputs: vec![TxOut {
            value: reward,
            script_pubkey,
        }],
        lock_time: 0,
    };

    let mut genesis = Block {
        header: crate::block::BlockHeader {
            version,
            prev_hash: H256::ZERO,
            merkle_root: H256::ZERO,
            time,
            bits,
            nonce,
        },
        auxpow: None,
        txs: vec![tx],
    };
    genesis.header.merkle_root = genesis.compute_merkle_root();
    genesis
}

fn checkpoint_table(entries: &[(i32, &str)]) -> BTreeMap<i32, H256> {
    entries
        .iter()
        .map(|(height, hash)| (*height, h256(hash)))
        .collect()
}

fn h256(s: &str) -> H256 {
    s.parse().expect("valid hash literal")
}

static GLOBAL_PARAMS: OnceCell<ChainParams> = OnceCell::new();

/// Select the process-wide parameter set. May only be called once.
pub fn select_params(
    network: Network,
    overrides: &RegtestOverrides,
) -> Result<&'static ChainParams, ChainParamsError> {
    let built = ChainParams::for_network(network, overrides)?;
    let selected = GLOBAL_PARAMS.get_or_init(|| built);
    if selected.network != network {
        return Err(ChainParamsError {
            field: "network",
            message: format!(
                "chain params already selected for '{}'",
                selected.network
            ),
        });
    }
    Ok(selected)
}

/// The selected parameter set; panics when called before selection.
pub fn params() -> &'static ChainParams {
    GLOBAL_PARAMS.get().expect("chain params not selected")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compact::encode_compact;

    #[test]
    fn test_main_genesis_constants() {
        let params = ChainParams::main();
        assert_eq!(
            params.genesis.hash().to_string(),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
        assert_eq!(params.genesis.header.time, 1231006505);
        assert_eq!(params.genesis.header.nonce, 2083236893);
        assert_eq!(params.genesis.header.bits, 0x1d00ffff);
        assert_eq!(params.genesis.txs[0].outputs[0].value, 50 * COIN);
    }

    #[test]
    fn test_test_and_regtest_genesis_constants() {
        let test = ChainParams::test();
        assert_eq!(
            test.genesis.hash().to_string(),
            "000000000933ea01ad0ee984209779baaec3ced90fa3f408719526f8d77f4943"
        );

        let regtest = ChainParams::regtest(&RegtestOverrides::default()).unwrap();
        assert_eq!(
            regtest.genesis.hash().to_string(),
            "0f9188f13cb7b2c71f2a335e3a4fc328bf5beb436012afca590b1a11466e2206"
        );
        assert_eq!(regtest.genesis.header.bits, 0x207fffff);
        assert_eq!(regtest.genesis.header.nonce, 2);
    }

    #[test]
    fn test_pow_limit_encodings() {
        let main = ChainParams::main();
        assert_eq!(encode_compact(&main.consensus.pow_limit), 0x1d00ffff);
        let regtest = ChainParams::regtest(&RegtestOverrides::default()).unwrap();
        assert_eq!(encode_compact(&regtest.consensus.pow_limit), 0x207fffff);
    }

    #[test]
    fn test_network_prefixes() {
        let main = ChainParams::main();
        assert_eq!(main.message_start, [0xfa, 0xc7, 0xb2, 0xda]);
        assert_eq!(main.default_port, 2333);
        assert_eq!(main.bech32_hrp, "plm");
        assert_eq!(main.base58_pubkey_prefix, 55);

        let test = ChainParams::test();
        assert_eq!(test.message_start, [0x0b, 0x11, 0x09, 0x07]);
        assert_eq!(test.default_port, 12333);
        assert_eq!(test.bech32_hrp, "tplm");

        let regtest = ChainParams::regtest(&RegtestOverrides::default()).unwrap();
        assert_eq!(regtest.message_start, [0xfa, 0xbf, 0xb5, 0xda]);
        assert_eq!(regtest.default_port, 28444);
        assert_eq!(regtest.bech32_hrp, "rplm");
    }

    #[test]
    fn test_adjustment_interval_branches() {
        let main = ChainParams::main();
        assert_eq!(main.consensus.adjustment_interval(1), 144);
        assert_eq!(main.consensus.adjustment_interval(28_999), 144);
        assert_eq!(main.consensus.adjustment_interval(29_000), 720);
    }

    #[test]
    fn test_segwit_height_override() {
        // -1 disables segwit by pushing activation out of range.
        let overrides = RegtestOverrides {
            segwit_height: Some(-1),
            ..Default::default()
        };
        let params = ChainParams::regtest(&overrides).unwrap();
        assert_eq!(params.consensus.segwit_height, MAX_BLOCK_HEIGHT);

        // Out-of-range values abort startup.
        let overrides = RegtestOverrides {
            segwit_height: Some(9_999_999_999),
            ..Default::default()
        };
        let err = ChainParams::regtest(&overrides).unwrap_err();
        assert_eq!(err.field, "segwitheight");

        let overrides = RegtestOverrides {
            segwit_height: Some(-2),
            ..Default::default()
        };
        assert!(ChainParams::regtest(&overrides).is_err());
    }

    #[test]
    fn test_auxpow_height_override() {
        let overrides = RegtestOverrides {
            auxpow_start_height: Some(10),
            ..Default::default()
        };
        let params = ChainParams::regtest(&overrides).unwrap();
        assert!(params.consensus.auxpow_active(10));
        assert!(!params.consensus.auxpow_active(9));
    }

    #[test]
    fn test_vbparams_override() {
        let overrides = RegtestOverrides {
            vbparams: vec!["testdummy:100:200".to_string()],
            ..Default::default()
        };
        let params = ChainParams::regtest(&overrides).unwrap();
        let deployment = params.consensus.deployment(DeploymentPos::TestDummy);
        assert_eq!(deployment.start_time, 100);
        assert_eq!(deployment.timeout, 200);
    }

    #[test]
    fn test_vbparams_malformed_rejected() {
        for bad in ["testdummy:100", "testdummy:x:200", "nosuch:1:2"] {
            let overrides = RegtestOverrides {
                vbparams: vec![bad.to_string()],
                ..Default::default()
            };
            let err = ChainParams::regtest(&overrides).unwrap_err();
            assert_eq!(err.field, "vbparams", "case {}", bad);
        }
    }

    #[test]
    fn test_block_subsidy_schedule() {
        let main = ChainParams::main();
        assert_eq!(block_subsidy(0, &main.consensus), 50 * COIN);
        assert_eq!(block_subsidy(209_999, &main.consensus), 50 * COIN);
        assert_eq!(block_subsidy(210_000, &main.consensus), 25 * COIN);
        assert_eq!(block_subsidy(420_000, &main.consensus), 12 * COIN + COIN / 2);
        // Subsidy runs out after 64 halvings.
        assert_eq!(block_subsidy(210_000 * 64, &main.consensus), 0);
    }

    #[test]
    fn test_checkpoints_present() {
        let main = ChainParams::main();
        assert_eq!(main.checkpoints.len(), 16);
        assert_eq!(main.checkpoints[&0], main.consensus.genesis_hash);
    }
}
