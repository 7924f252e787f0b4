//! Shared application state.

use palladium_chain::ChainState;
use palladium_mining::{TemplateBuilder, TipSignal, TxPool};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Shared state behind every RPC handler.
///
/// The chain lock is the validation lock: handlers hold it for the
/// whole of a validation or template build, never across a long poll.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<RwLock<ChainState>>,
    pub pool: Arc<RwLock<TxPool>>,
    pub templates: Arc<TemplateBuilder>,
    pub signal: Arc<TipSignal>,
    /// Coinbase extra nonce for the regtest generator.
    pub extra_nonce: Arc<Mutex<u64>>,
}

impl AppState {
    pub fn new(chain: ChainState) -> Self {
        let chain = Arc::new(RwLock::new(chain));
        let pool = Arc::new(RwLock::new(TxPool::new()));
        let signal = Arc::new(TipSignal::new());
        let templates = Arc::new(TemplateBuilder::new(
            Arc::clone(&chain),
            Arc::clone(&pool),
            Arc::clone(&signal),
        ));
        AppState {
            chain,
            pool,
            templates,
            signal,
            extra_nonce: Arc::new(Mutex::new(0)),
        }
    }
}
