//! Visit requests and visitor registration
//!
//! Three entry points share the same shape: resolve the host, find or create
//! the visitor, insert a pending visit, render a visit pass and email it.
//! The writes are independent requests. A failure after the visitor write
//! leaves that write in place, and email failures never undo anything; they
//! are logged and reported through `RegistrationOutcome::email_sent`.

use auth::validation::validate_email;
use auth::{Host, Role};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{VisitsError, VisitsResult};
use crate::models::visit::resolve_local;
use crate::models::{NewVisit, NewVisitor, Visitor, VisitorUpdate};
use crate::notify::{Mailer, VisitEmail, display_time};
use crate::photos::{PhotoStorage, PhotoUpload};
use crate::qr::VisitPass;
use crate::repositories::{VisitorsRepository, VisitsRepository};
use auth::repositories::HostsRepository;

/// Placeholder stored when a phone number is not given
pub const NO_PHONE: &str = "N/A";

/// Public visit request
#[derive(Debug, Clone, Default)]
pub struct VisitRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub purpose: String,
    /// Host to visit; the request is left unassigned when empty or unknown
    pub host_email: Option<String>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub valid_until: DateTime<Utc>,
    pub notes: Option<String>,
    pub photo: Option<PhotoUpload>,
}

/// Walk-in registration by staff
#[derive(Debug, Clone, Default)]
pub struct StaffRegistration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub purpose: String,
    pub host_email: String,
    pub valid_until: DateTime<Utc>,
    pub photo: Option<PhotoUpload>,
}

/// Invitation created ahead of the visit
#[derive(Debug, Clone)]
pub struct PreRegistration {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub purpose: String,
    pub host_email: String,
    pub visit_date: NaiveDate,
    pub check_in_time: NaiveTime,
    pub photo: Option<PhotoUpload>,
}

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationOutcome {
    pub visit_id: Uuid,
    pub visitor_id: Uuid,
    pub host: Option<Host>,
    pub valid_until: DateTime<Utc>,
    /// PNG data URL of the visit pass
    pub qr_code: String,
    pub email_sent: bool,
}

pub struct RegistrationService {
    visitors: Arc<dyn VisitorsRepository>,
    visits: Arc<dyn VisitsRepository>,
    hosts: Arc<dyn HostsRepository>,
    photos: Arc<dyn PhotoStorage>,
    mailer: Arc<dyn Mailer>,
}

impl RegistrationService {
    pub fn new(
        visitors: Arc<dyn VisitorsRepository>,
        visits: Arc<dyn VisitsRepository>,
        hosts: Arc<dyn HostsRepository>,
        photos: Arc<dyn PhotoStorage>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            visitors,
            visits,
            hosts,
            photos,
            mailer,
        }
    }

    /// Submit a public visit request
    ///
    /// A photo that fails to upload aborts the request before anything is
    /// written. An existing visitor (matched by email) has their details
    /// replaced by the submitted ones.
    pub async fn request_visit(&self, request: VisitRequest) -> VisitsResult<RegistrationOutcome> {
        validate_contact(&request.name, &request.email)?;
        require(&request.phone, "Phone is required")?;
        require(&request.purpose, "Purpose is required")?;

        let photo_url = match &request.photo {
            Some(photo) => Some(
                self.photos
                    .store(photo, false)
                    .await
                    .map_err(|e| VisitsError::PhotoUpload(e.to_string()))?,
            ),
            None => None,
        };

        let host = match request.host_email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => {
                self.hosts.find_by_email(email, Some(Role::Host)).await?
            }
            _ => None,
        };

        let email = request.email.trim();
        let company = request
            .company
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let visitor = match self.visitors.find_by_email(email).await? {
            Some(existing) => {
                let changes = VisitorUpdate {
                    name: Some(request.name.trim().to_string()),
                    phone: Some(request.phone.trim().to_string()),
                    company: Some(company),
                    photo_url: Some(photo_url),
                    ..VisitorUpdate::new(Utc::now())
                };
                self.visitors.update(existing.id, &changes).await?
            }
            None => {
                self.visitors
                    .create(&NewVisitor {
                        name: request.name.trim().to_string(),
                        email: email.to_string(),
                        phone: request.phone.trim().to_string(),
                        company,
                        photo_url,
                    })
                    .await?
            }
        };

        let visit = NewVisit {
            check_in_time: request.check_in_time,
            check_out_time: request.check_out_time,
            notes: request
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            ..NewVisit::pending(
                visitor.id,
                host.as_ref().map(|h| h.id),
                request.purpose.trim(),
                request.valid_until,
            )
        };
        self.visits.create(&visit).await?;
        info!("Visit {} requested by {}", visit.id, visitor.email);

        let qr_code = VisitPass::new(visit.id).with_name(&visitor.name).to_data_url()?;
        let email_sent = self
            .notify(&visitor, &visit, host.as_ref(), &qr_code)
            .await;

        Ok(RegistrationOutcome {
            visit_id: visit.id,
            visitor_id: visitor.id,
            host,
            valid_until: visit.valid_until,
            qr_code,
            email_sent,
        })
    }

    /// Register a walk-in visitor for an existing host
    ///
    /// An existing visitor keeps their record; their photo is replaced only
    /// when a new one uploads. Photo failures are logged and ignored.
    pub async fn register_visitor(
        &self,
        registration: StaffRegistration,
    ) -> VisitsResult<RegistrationOutcome> {
        validate_contact(&registration.name, &registration.email)?;
        require(&registration.phone, "Phone is required")?;
        require(&registration.purpose, "Purpose is required")?;

        let host = self.require_host(&registration.host_email).await?;
        let email = registration.email.trim();

        let visitor = match self.visitors.find_by_email(email).await? {
            Some(existing) => match &registration.photo {
                Some(photo) => self.replace_photo(existing, photo).await,
                None => existing,
            },
            None => {
                let photo_url = match &registration.photo {
                    Some(photo) => self.try_store(photo, false).await,
                    None => None,
                };
                self.visitors
                    .create(&NewVisitor {
                        name: registration.name.trim().to_string(),
                        email: email.to_string(),
                        phone: registration.phone.trim().to_string(),
                        company: None,
                        photo_url,
                    })
                    .await?
            }
        };

        let visit = NewVisit::pending(
            visitor.id,
            Some(host.id),
            registration.purpose.trim(),
            registration.valid_until,
        );
        self.visits.create(&visit).await?;
        info!("Visitor {} registered for host {}", visitor.email, host.email);

        let pass = VisitPass {
            name: Some(visitor.name.clone()),
            email: Some(visitor.email.clone()),
            purpose: Some(visit.purpose.clone()),
            valid_until: Some(visit.valid_until.to_rfc3339()),
            host_name: Some(host.name.clone()),
            ..VisitPass::new(visit.id)
        };
        let qr_code = pass.to_data_url()?;
        let email_sent = self.notify(&visitor, &visit, Some(&host), &qr_code).await;

        Ok(RegistrationOutcome {
            visit_id: visit.id,
            visitor_id: visitor.id,
            host: Some(host),
            valid_until: visit.valid_until,
            qr_code,
            email_sent,
        })
    }

    /// Invite a visitor ahead of time on behalf of a host
    ///
    /// The pass is valid until the chosen check-in time on the visit date,
    /// read in `tz`.
    pub async fn pre_register<Tz: TimeZone>(
        &self,
        actor: &Host,
        registration: PreRegistration,
        tz: &Tz,
    ) -> VisitsResult<RegistrationOutcome> {
        let valid_until = resolve_local(registration.visit_date, registration.check_in_time, tz);
        self.pre_register_until(actor, registration, valid_until)
            .await
    }

    async fn pre_register_until(
        &self,
        actor: &Host,
        registration: PreRegistration,
        valid_until: DateTime<Utc>,
    ) -> VisitsResult<RegistrationOutcome> {
        validate_contact(&registration.name, &registration.email)?;
        require(&registration.purpose, "Purpose is required")?;

        let host = self.require_host(&registration.host_email).await?;
        if actor.role == Role::Host && actor.id != host.id {
            return Err(VisitsError::Forbidden(
                "Hosts can only pre-register their own visitors".to_string(),
            ));
        }

        let email = registration.email.trim();
        let visitor = match self.visitors.find_by_email(email).await? {
            Some(existing) => existing,
            None => {
                let phone = registration
                    .phone
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .unwrap_or(NO_PHONE);
                self.visitors
                    .create(&NewVisitor {
                        name: registration.name.trim().to_string(),
                        email: email.to_string(),
                        phone: phone.to_string(),
                        company: None,
                        photo_url: None,
                    })
                    .await?
            }
        };

        let visitor = match &registration.photo {
            Some(photo) => self.replace_photo(visitor, photo).await,
            None => visitor,
        };

        let visit = NewVisit::pending(
            visitor.id,
            Some(host.id),
            registration.purpose.trim(),
            valid_until,
        );
        self.visits.create(&visit).await?;
        info!(
            "Visitor {} pre-registered by {} for {}",
            visitor.email, actor.email, host.email
        );

        let qr_code = VisitPass::new(visit.id).to_data_url()?;
        let email_sent = self.notify(&visitor, &visit, Some(&host), &qr_code).await;

        Ok(RegistrationOutcome {
            visit_id: visit.id,
            visitor_id: visitor.id,
            host: Some(host),
            valid_until,
            qr_code,
            email_sent,
        })
    }

    async fn require_host(&self, email: &str) -> VisitsResult<Host> {
        let email = email.trim();
        if email.is_empty() {
            return Err(VisitsError::Validation("Host email is required".to_string()));
        }
        self.hosts
            .find_by_email(email, None)
            .await?
            .ok_or_else(|| VisitsError::HostNotFound(email.to_string()))
    }

    async fn try_store(&self, photo: &PhotoUpload, upsert: bool) -> Option<String> {
        match self.photos.store(photo, upsert).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Error uploading photo: {}", e);
                None
            }
        }
    }

    async fn replace_photo(&self, visitor: Visitor, photo: &PhotoUpload) -> Visitor {
        let Some(url) = self.try_store(photo, true).await else {
            return visitor;
        };

        let changes = VisitorUpdate {
            photo_url: Some(Some(url)),
            ..VisitorUpdate::new(Utc::now())
        };
        match self.visitors.update(visitor.id, &changes).await {
            Ok(updated) => updated,
            Err(e) => {
                error!("Error updating visitor photo URL: {}", e);
                visitor
            }
        }
    }

    async fn notify(
        &self,
        visitor: &Visitor,
        visit: &NewVisit,
        host: Option<&Host>,
        qr_code: &str,
    ) -> bool {
        let email = VisitEmail {
            to_name: visitor.name.clone(),
            to_email: visitor.email.clone(),
            qr_code: qr_code.to_string(),
            visit_id: visit.id.to_string(),
            visit_purpose: visit.purpose.clone(),
            host_name: host.map(|h| h.name.clone()).unwrap_or_else(|| "N/A".to_string()),
            valid_until: display_time(&visit.valid_until),
        };

        match self.mailer.send_visit_pass(&email).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Visit pass for {} was not emailed: {}", visit.id, e);
                false
            }
        }
    }
}

fn require(value: &str, message: &str) -> VisitsResult<()> {
    if value.trim().is_empty() {
        return Err(VisitsError::Validation(message.to_string()));
    }
    Ok(())
}

fn validate_contact(name: &str, email: &str) -> VisitsResult<()> {
    require(name, "Name is required")?;
    validate_email(email.trim()).map_err(VisitsError::Validation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitStatus;
    use crate::notify::MockMailer;
    use crate::photos::MockPhotoStorage;
    use crate::repositories::{MockVisitorsRepository, MockVisitsRepository};
    use auth::repositories::MockHostsRepository;
    use chrono::{Duration, FixedOffset};
    use common::PlatformError;
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    fn host(role: Role) -> Host {
        Host {
            id: Uuid::new_v4(),
            auth_id: Uuid::new_v4(),
            name: "Prof. Smith".to_string(),
            email: "smith@example.com".to_string(),
            department_id: None,
            role,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn visitor(email: &str) -> Visitor {
        Visitor {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            company: None,
            photo_url: Some("https://cdn.example/old.png".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn photo() -> PhotoUpload {
        PhotoUpload {
            file_name: "face.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    fn request() -> VisitRequest {
        VisitRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            purpose: "Interview".to_string(),
            valid_until: Utc::now() + Duration::hours(4),
            ..VisitRequest::default()
        }
    }

    fn ok_mailer() -> MockMailer {
        let mut mailer = MockMailer::new();
        mailer.expect_send_visit_pass().returning(|_| Ok(()));
        mailer
    }

    fn service(
        visitors: MockVisitorsRepository,
        visits: MockVisitsRepository,
        hosts: MockHostsRepository,
        photos: MockPhotoStorage,
        mailer: MockMailer,
    ) -> RegistrationService {
        RegistrationService::new(
            Arc::new(visitors),
            Arc::new(visits),
            Arc::new(hosts),
            Arc::new(photos),
            Arc::new(mailer),
        )
    }

    #[tokio::test]
    async fn test_new_email_creates_one_visitor_and_one_pending_visit() {
        let mut visitors = MockVisitorsRepository::new();
        visitors
            .expect_find_by_email()
            .with(eq("ada@example.com"))
            .times(1)
            .returning(|_| Ok(None));
        visitors
            .expect_create()
            .withf(|new| new.email == "ada@example.com" && new.photo_url.is_none())
            .times(1)
            .returning(|new| Ok(visitor(&new.email)));
        visitors.expect_update().never();

        let mut visits = MockVisitsRepository::new();
        visits
            .expect_create()
            .withf(|visit| visit.status == VisitStatus::Pending && visit.host_id.is_none())
            .times(1)
            .returning(|_| Ok(()));

        let mut hosts = MockHostsRepository::new();
        hosts.expect_find_by_email().never();

        let outcome = assert_ok!(
            service(visitors, visits, hosts, MockPhotoStorage::new(), ok_mailer())
                .request_visit(request())
                .await
        );

        assert!(outcome.email_sent);
        assert!(outcome.host.is_none());
        assert!(outcome.qr_code.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_existing_email_updates_visitor_without_insert() {
        let existing = visitor("ada@example.com");
        let existing_id = existing.id;

        let mut visitors = MockVisitorsRepository::new();
        visitors
            .expect_find_by_email()
            .returning(move |_| Ok(Some(existing.clone())));
        visitors.expect_create().never();
        visitors
            .expect_update()
            .withf(move |id, changes| {
                *id == existing_id
                    && changes.name.as_deref() == Some("Ada Lovelace")
                    && changes.photo_url == Some(None)
            })
            .times(1)
            .returning(|id, _| {
                let mut updated = visitor("ada@example.com");
                updated.id = id;
                Ok(updated)
            });

        let mut visits = MockVisitsRepository::new();
        visits
            .expect_create()
            .withf(move |visit| visit.visitor_id == existing_id)
            .times(1)
            .returning(|_| Ok(()));

        let request = VisitRequest {
            name: "Ada Lovelace".to_string(),
            ..request()
        };
        let outcome = assert_ok!(
            service(
                visitors,
                visits,
                MockHostsRepository::new(),
                MockPhotoStorage::new(),
                ok_mailer()
            )
            .request_visit(request)
            .await
        );

        assert_eq!(outcome.visitor_id, existing_id);
    }

    #[tokio::test]
    async fn test_request_resolves_host_by_role() {
        let target = host(Role::Host);
        let target_id = target.id;

        let mut hosts = MockHostsRepository::new();
        hosts
            .expect_find_by_email()
            .with(eq("smith@example.com"), eq(Some(Role::Host)))
            .times(1)
            .returning(move |_, _| Ok(Some(target.clone())));

        let mut visitors = MockVisitorsRepository::new();
        visitors.expect_find_by_email().returning(|_| Ok(None));
        visitors
            .expect_create()
            .returning(|new| Ok(visitor(&new.email)));

        let mut visits = MockVisitsRepository::new();
        visits
            .expect_create()
            .withf(move |visit| visit.host_id == Some(target_id))
            .times(1)
            .returning(|_| Ok(()));

        let mut mailer = MockMailer::new();
        mailer
            .expect_send_visit_pass()
            .withf(|email| email.host_name == "Prof. Smith")
            .times(1)
            .returning(|_| Ok(()));

        let request = VisitRequest {
            host_email: Some(" smith@example.com ".to_string()),
            ..request()
        };
        assert_ok!(
            service(visitors, visits, hosts, MockPhotoStorage::new(), mailer)
                .request_visit(request)
                .await
        );
    }

    #[tokio::test]
    async fn test_request_photo_failure_aborts_before_writes() {
        let mut photos = MockPhotoStorage::new();
        photos
            .expect_store()
            .returning(|_, _| Err(PlatformError::Realtime("bucket offline".to_string())));

        let mut visitors = MockVisitorsRepository::new();
        visitors.expect_find_by_email().never();
        visitors.expect_create().never();
        let mut visits = MockVisitsRepository::new();
        visits.expect_create().never();

        let request = VisitRequest {
            photo: Some(photo()),
            ..request()
        };
        let err = assert_err!(
            service(
                visitors,
                visits,
                MockHostsRepository::new(),
                photos,
                MockMailer::new()
            )
            .request_visit(request)
            .await
        );
        assert!(matches!(err, VisitsError::PhotoUpload(_)));
    }

    #[tokio::test]
    async fn test_email_failure_keeps_the_visit() {
        let mut visitors = MockVisitorsRepository::new();
        visitors.expect_find_by_email().returning(|_| Ok(None));
        visitors
            .expect_create()
            .returning(|new| Ok(visitor(&new.email)));

        let mut visits = MockVisitsRepository::new();
        visits.expect_create().times(1).returning(|_| Ok(()));

        let mut mailer = MockMailer::new();
        mailer
            .expect_send_visit_pass()
            .returning(|_| Err(VisitsError::Email("503".to_string())));

        let outcome = assert_ok!(
            service(
                visitors,
                visits,
                MockHostsRepository::new(),
                MockPhotoStorage::new(),
                mailer
            )
            .request_visit(request())
            .await
        );
        assert!(!outcome.email_sent);
    }

    #[tokio::test]
    async fn test_invalid_email_sends_nothing() {
        let mut visitors = MockVisitorsRepository::new();
        visitors.expect_find_by_email().never();

        let request = VisitRequest {
            email: "not-an-email".to_string(),
            ..request()
        };
        let err = assert_err!(
            service(
                visitors,
                MockVisitsRepository::new(),
                MockHostsRepository::new(),
                MockPhotoStorage::new(),
                MockMailer::new()
            )
            .request_visit(request)
            .await
        );
        assert!(matches!(err, VisitsError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_visitor_requires_known_host() {
        let mut hosts = MockHostsRepository::new();
        hosts
            .expect_find_by_email()
            .with(eq("nobody@example.com"), eq(None::<Role>))
            .returning(|_, _| Ok(None));

        let mut visits = MockVisitsRepository::new();
        visits.expect_create().never();

        let registration = StaffRegistration {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            purpose: "Delivery".to_string(),
            host_email: "nobody@example.com".to_string(),
            valid_until: Utc::now(),
            photo: None,
        };
        let err = assert_err!(
            service(
                MockVisitorsRepository::new(),
                visits,
                hosts,
                MockPhotoStorage::new(),
                MockMailer::new()
            )
            .register_visitor(registration)
            .await
        );
        assert_eq!(err.to_string(), "Host not found with email: nobody@example.com");
    }

    #[tokio::test]
    async fn test_register_existing_visitor_photo_failure_is_ignored() {
        let existing = visitor("ada@example.com");
        let existing_id = existing.id;
        let target = host(Role::Guard);

        let mut hosts = MockHostsRepository::new();
        hosts
            .expect_find_by_email()
            .returning(move |_, _| Ok(Some(target.clone())));

        let mut visitors = MockVisitorsRepository::new();
        visitors
            .expect_find_by_email()
            .returning(move |_| Ok(Some(existing.clone())));
        visitors.expect_create().never();
        visitors.expect_update().never();

        let mut photos = MockPhotoStorage::new();
        photos
            .expect_store()
            .with(eq(photo()), eq(true))
            .returning(|_, _| Err(PlatformError::Realtime("bucket offline".to_string())));

        let mut visits = MockVisitsRepository::new();
        visits
            .expect_create()
            .withf(move |visit| visit.visitor_id == existing_id)
            .times(1)
            .returning(|_| Ok(()));

        let registration = StaffRegistration {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            purpose: "Delivery".to_string(),
            host_email: "smith@example.com".to_string(),
            valid_until: Utc::now(),
            photo: Some(photo()),
        };
        let outcome = assert_ok!(
            service(visitors, visits, hosts, photos, ok_mailer())
                .register_visitor(registration)
                .await
        );
        assert_eq!(outcome.visitor_id, existing_id);
    }

    #[tokio::test]
    async fn test_pre_register_composes_local_valid_until() {
        let target = host(Role::Host);
        let actor = target.clone();

        let mut hosts = MockHostsRepository::new();
        hosts
            .expect_find_by_email()
            .returning(move |_, _| Ok(Some(target.clone())));

        let mut visitors = MockVisitorsRepository::new();
        visitors.expect_find_by_email().returning(|_| Ok(None));
        visitors
            .expect_create()
            .withf(|new| new.phone == NO_PHONE)
            .times(1)
            .returning(|new| Ok(visitor(&new.email)));

        let mut visits = MockVisitsRepository::new();
        visits.expect_create().times(1).returning(|_| Ok(()));

        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let registration = PreRegistration {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            purpose: "Seminar".to_string(),
            host_email: "smith@example.com".to_string(),
            visit_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            check_in_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            photo: None,
        };

        let outcome = assert_ok!(
            service(visitors, visits, hosts, MockPhotoStorage::new(), ok_mailer())
                .pre_register(&actor, registration, &tz)
                .await
        );
        assert_eq!(outcome.valid_until.to_rfc3339(), "2024-03-10T07:30:00+00:00");
    }

    #[tokio::test]
    async fn test_host_cannot_pre_register_for_another_host() {
        let target = host(Role::Host);
        let actor = host(Role::Host);

        let mut hosts = MockHostsRepository::new();
        hosts
            .expect_find_by_email()
            .returning(move |_, _| Ok(Some(target.clone())));

        let mut visitors = MockVisitorsRepository::new();
        visitors.expect_find_by_email().never();

        let registration = PreRegistration {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            purpose: "Seminar".to_string(),
            host_email: "smith@example.com".to_string(),
            visit_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            check_in_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            photo: None,
        };

        let err = assert_err!(
            service(
                visitors,
                MockVisitsRepository::new(),
                hosts,
                MockPhotoStorage::new(),
                MockMailer::new()
            )
            .pre_register(&actor, registration, &Utc)
            .await
        );
        assert!(matches!(err, VisitsError::Forbidden(_)));
    }
}
