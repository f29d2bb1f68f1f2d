//! Shared clients and services for one invocation

use anyhow::{Result, bail};
use auth::accounts::UserManagement;
use auth::provider::{IdentityProvider, PlatformIdentity};
use auth::repositories::{
    DepartmentsRepository, HostsRepository, PlatformDepartmentsRepository, PlatformHostsRepository,
};
use auth::session::FileSessionStore;
use auth::{AuthStore, Host};
use common::realtime::{ChangeFeed, RealtimeClient};
use common::{AppConfig, PlatformClient};
use dashboard::StatsService;
use std::sync::Arc;
use tracing::warn;
use visits::bulk::BulkUploadService;
use visits::notify::{Mailer, mailer_from_config};
use visits::photos::{BucketPhotoStorage, PhotoStorage};
use visits::repositories::{
    PlatformVisitorsRepository, PlatformVisitsRepository, VisitorsRepository, VisitsRepository,
};
use visits::{ApprovalService, DisplayBoard, RegistrationService, VisitLogs};

use crate::router::{Access, Route, gate};

/// Application state shared by command handlers
pub struct AppContext {
    pub config: AppConfig,
    pub auth: AuthStore,
    pub identity: Arc<dyn IdentityProvider>,
    pub hosts: Arc<dyn HostsRepository>,
    pub departments: Arc<dyn DepartmentsRepository>,
    pub visitors: Arc<dyn VisitorsRepository>,
    pub visits: Arc<dyn VisitsRepository>,
    pub photos: Arc<dyn PhotoStorage>,
    pub mailer: Arc<dyn Mailer>,
    pub feed: Arc<dyn ChangeFeed>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = PlatformClient::new(&config.platform)?;

        let identity: Arc<dyn IdentityProvider> = Arc::new(PlatformIdentity::new(client.clone()));
        let hosts: Arc<dyn HostsRepository> = Arc::new(PlatformHostsRepository::new(client.clone()));
        let sessions = Arc::new(FileSessionStore::new(config.session.path.clone()));
        let auth = AuthStore::new(identity.clone(), hosts.clone(), sessions);

        Ok(Self {
            departments: Arc::new(PlatformDepartmentsRepository::new(client.clone())),
            visitors: Arc::new(PlatformVisitorsRepository::new(client.clone())),
            visits: Arc::new(PlatformVisitsRepository::new(client.clone())),
            photos: Arc::new(BucketPhotoStorage::new(
                client.clone(),
                &config.storage.photo_bucket,
            )),
            mailer: mailer_from_config(&config.email)?,
            feed: Arc::new(RealtimeClient::new(client)),
            identity,
            hosts,
            auth,
            config,
        })
    }

    /// Restore the session and check that `route` may be opened
    ///
    /// Returns the signed-in user, if any.
    pub async fn open(&self, route: Route) -> Result<Option<Host>> {
        if let Err(e) = self.auth.initialize().await {
            if !route.is_public() {
                return Err(e.into());
            }
            warn!("Continuing signed out: {}", e);
        }

        match gate(route, &self.auth.state()) {
            Access::Allowed => Ok(self.auth.current_user()),
            Access::Redirect(to) => bail!("Please sign in first with `vms login` ({})", to),
            Access::Forbidden => bail!("You do not have access to {}", route),
        }
    }

    /// Like `open` for routes that need a signed-in user
    pub async fn open_private(&self, route: Route) -> Result<Host> {
        match self.open(route).await? {
            Some(user) => Ok(user),
            None => bail!("Please sign in first with `vms login` ({})", Route::Login),
        }
    }

    pub fn registration(&self) -> RegistrationService {
        RegistrationService::new(
            self.visitors.clone(),
            self.visits.clone(),
            self.hosts.clone(),
            self.photos.clone(),
            self.mailer.clone(),
        )
    }

    pub fn approvals(&self) -> ApprovalService {
        ApprovalService::new(self.visits.clone(), self.mailer.clone())
    }

    pub fn bulk_upload(&self) -> BulkUploadService {
        BulkUploadService::new(self.visitors.clone(), self.visits.clone(), self.hosts.clone())
    }

    pub fn display_board(&self) -> DisplayBoard {
        DisplayBoard::new(self.visits.clone())
    }

    pub fn visit_logs(&self) -> VisitLogs {
        VisitLogs::new(self.visits.clone())
    }

    pub fn user_management(&self) -> UserManagement {
        UserManagement::new(
            self.identity.clone(),
            self.hosts.clone(),
            self.departments.clone(),
        )
    }

    pub fn stats(&self) -> StatsService {
        StatsService::new(self.visits.clone(), self.hosts.clone())
    }
}
