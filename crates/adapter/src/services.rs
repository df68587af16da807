//! Wiring of the remote components around one store and one transport.

use std::sync::Arc;

use tracing::info;

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::leaderboard::LeaderboardReconciler;
use crate::login::AuthClient;
use crate::records::ScoreRecords;
use crate::session::Session;
use crate::store::{JsonFileStore, LocalStore};
use crate::submit::ScoreCoordinator;
use crate::transport::{HttpTransport, Transport};

#[derive(Debug, Clone)]
pub struct RemoteServices {
    pub session: Arc<Session>,
    pub records: Arc<ScoreRecords>,
    pub coordinator: Arc<ScoreCoordinator>,
    pub reconciler: Arc<LeaderboardReconciler>,
    pub auth: Arc<AuthClient>,
}

impl RemoteServices {
    /// File-backed store under `config.data_dir` and a reqwest transport.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let store = JsonFileStore::open(config.store_path())?;
        let transport = HttpTransport::new(config)?;
        info!(
            store = %store.path().display(),
            base_url = %config.base_url,
            offline = config.offline,
            "remote services ready"
        );
        Ok(Self::with_parts(config, Arc::new(store), Arc::new(transport)))
    }

    pub fn with_parts(
        config: &ServiceConfig,
        store: Arc<dyn LocalStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let session = Arc::new(Session::new(Arc::clone(&store)));
        let records = Arc::new(ScoreRecords::new(store));
        let coordinator = Arc::new(ScoreCoordinator::new(
            Arc::clone(&session),
            Arc::clone(&records),
            Arc::clone(&transport),
            config,
        ));
        let reconciler = Arc::new(LeaderboardReconciler::new(
            Arc::clone(&session),
            Arc::clone(&records),
            Arc::clone(&transport),
            config,
        ));
        let auth = Arc::new(AuthClient::new(Arc::clone(&session), transport, config));

        Self {
            session,
            records,
            coordinator,
            reconciler,
            auth,
        }
    }
}
