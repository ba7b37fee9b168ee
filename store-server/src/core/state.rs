use std::sync::Arc;

use sqlx::SqlitePool;

use crate::core::Config;
use crate::db::DbService;
use crate::gateway::{HttpGateway, PaymentGateway};
use crate::services::{Mailer, MemoryMailer, Provisioner, SesMailer, UuidProvisioner};

/// Server state — shared handles to every collaborator.
///
/// Cloning is cheap: the pool and the trait objects are reference-counted.
/// External collaborators (gateway, mailer, provisioner) sit behind traits so
/// tests can swap them without touching the pipeline.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub gateway: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn Mailer>,
    pub provisioner: Arc<dyn Provisioner>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .finish()
    }
}

impl ServerState {
    /// Assemble state from explicit parts (tests inject their own
    /// gateway/mailer doubles here)
    pub fn with_parts(
        config: Config,
        pool: SqlitePool,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
        provisioner: Arc<dyn Provisioner>,
    ) -> Self {
        Self {
            config,
            pool,
            gateway,
            mailer,
            provisioner,
        }
    }

    /// Initialize server state:
    /// 1. work dir structure
    /// 2. database (work_dir/database/store.db)
    /// 3. gateway client, mailer, provisioner
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("store.db");
        let db = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        let gateway: Arc<dyn PaymentGateway> = Arc::new(HttpGateway::new(
            config.gateway_base_url.clone(),
            config.gateway_server_key.clone(),
        ));

        let mailer: Arc<dyn Mailer> = if config.mail_from.is_empty() {
            tracing::warn!("MAIL_FROM not configured — delivery emails are captured, not sent");
            Arc::new(MemoryMailer::default())
        } else {
            Arc::new(SesMailer::new().await)
        };

        Self::with_parts(
            config.clone(),
            db.pool,
            gateway,
            mailer,
            Arc::new(UuidProvisioner),
        )
    }

    /// Spawn background tasks. Must be called before `Server::run()`.
    pub fn start_background_tasks(&self) {
        crate::core::tasks::spawn_pending_order_sweeper(self.clone());
    }
}
