//! Visit approval workflow
//!
//! Every action checks the lifecycle locally first, so an illegal action on a
//! loaded visit is rejected without a request. The write itself only matches
//! a row still in the status the caller saw.

use auth::{Host, Role};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{VisitsError, VisitsResult};
use crate::models::{VisitAction, VisitDetails, VisitFilter, VisitStatus, VisitUpdate};
use crate::notify::{Mailer, VisitEmail, display_time};
use crate::qr::VisitPass;
use crate::repositories::VisitsRepository;

/// Result of an approval action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// The visit as stored after the action
    pub visit: VisitDetails,
    /// Pass regenerated on approval
    pub qr_code: Option<String>,
    pub email_sent: bool,
}

pub struct ApprovalService {
    visits: Arc<dyn VisitsRepository>,
    mailer: Arc<dyn Mailer>,
}

impl ApprovalService {
    pub fn new(visits: Arc<dyn VisitsRepository>, mailer: Arc<dyn Mailer>) -> Self {
        Self { visits, mailer }
    }

    /// Pending visits the viewer may act on, newest first
    ///
    /// Hosts only see their own visits.
    pub async fn pending_visits(&self, viewer: &Host) -> VisitsResult<Vec<VisitDetails>> {
        let filter = VisitFilter::status(VisitStatus::Pending).for_host(scope(viewer));
        Ok(self.visits.list(&filter).await?)
    }

    pub async fn approve(&self, actor: &Host, visit_id: Uuid) -> VisitsResult<ActionOutcome> {
        self.apply(actor, visit_id, VisitAction::Approve).await
    }

    pub async fn deny(&self, actor: &Host, visit_id: Uuid) -> VisitsResult<ActionOutcome> {
        self.apply(actor, visit_id, VisitAction::Deny).await
    }

    pub async fn complete(&self, actor: &Host, visit_id: Uuid) -> VisitsResult<ActionOutcome> {
        self.apply(actor, visit_id, VisitAction::Complete).await
    }

    pub async fn cancel(&self, actor: &Host, visit_id: Uuid) -> VisitsResult<ActionOutcome> {
        self.apply(actor, visit_id, VisitAction::Cancel).await
    }

    pub async fn check_in(&self, actor: &Host, visit_id: Uuid) -> VisitsResult<ActionOutcome> {
        self.apply(actor, visit_id, VisitAction::CheckIn).await
    }

    /// Load a visit and apply `action` to it
    pub async fn apply(
        &self,
        actor: &Host,
        visit_id: Uuid,
        action: VisitAction,
    ) -> VisitsResult<ActionOutcome> {
        let visit = self
            .visits
            .find(visit_id)
            .await?
            .ok_or(VisitsError::NotFound(visit_id))?;
        self.apply_to(actor, &visit, action).await
    }

    /// Apply `action` to an already loaded visit
    pub async fn apply_to(
        &self,
        actor: &Host,
        visit: &VisitDetails,
        action: VisitAction,
    ) -> VisitsResult<ActionOutcome> {
        authorize(actor, visit)?;

        let from = visit.visit.status;
        let to = action
            .transition(from)
            .ok_or(VisitsError::InvalidTransition { from, action })?;
        if action == VisitAction::CheckIn && visit.visit.check_in_time.is_some() {
            return Err(VisitsError::Validation(
                "Visitor is already checked in".to_string(),
            ));
        }

        let changes = VisitUpdate::for_action(action, to, Utc::now());
        let updated = self
            .visits
            .update_status(visit.visit.id, from, &changes)
            .await?
            .ok_or(VisitsError::StatusChanged(visit.visit.id))?;
        info!(
            "Visit {} moved from {} to {} by {}",
            updated.visit.id, from, to, actor.email
        );

        if action != VisitAction::Approve {
            return Ok(ActionOutcome {
                visit: updated,
                qr_code: None,
                email_sent: false,
            });
        }

        let qr_code = approval_pass(&updated).to_data_url()?;
        let email_sent = self.send_pass(&updated, &qr_code).await;

        Ok(ActionOutcome {
            visit: updated,
            qr_code: Some(qr_code),
            email_sent,
        })
    }

    async fn send_pass(&self, visit: &VisitDetails, qr_code: &str) -> bool {
        let Some(visitor) = &visit.visitor else {
            warn!("Visit {} has no visitor to notify", visit.visit.id);
            return false;
        };

        let email = VisitEmail {
            to_name: visitor.name.clone(),
            to_email: visitor.email.clone(),
            qr_code: qr_code.to_string(),
            visit_id: visit.visit.id.to_string(),
            visit_purpose: visit.visit.purpose.clone(),
            host_name: visit.host_name().to_string(),
            valid_until: display_time(&visit.visit.valid_until),
        };

        match self.mailer.send_visit_pass(&email).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Approval email for {} was not sent: {}", visit.visit.id, e);
                false
            }
        }
    }
}

/// Host filter for a viewer; staff see everything
pub fn scope(viewer: &Host) -> Option<Uuid> {
    (!viewer.role.is_staff()).then_some(viewer.id)
}

/// Staff may act on any visit, hosts only on their own
pub fn authorize(actor: &Host, visit: &VisitDetails) -> VisitsResult<()> {
    if !actor.role.is_supported() {
        return Err(VisitsError::Forbidden(
            "This role is no longer supported".to_string(),
        ));
    }
    if actor.role.is_staff() || (actor.role == Role::Host && visit.visit.host_id == Some(actor.id))
    {
        return Ok(());
    }
    Err(VisitsError::Forbidden(
        "You can only manage your own visitors".to_string(),
    ))
}

/// Visits whose visitor name, visitor email or purpose contains `term`
pub fn filter_visits<'a>(visits: &'a [VisitDetails], term: &str) -> Vec<&'a VisitDetails> {
    let term = term.trim().to_lowercase();
    visits
        .iter()
        .filter(|visit| {
            term.is_empty()
                || visit.visitor_name().to_lowercase().contains(&term)
                || visit.visitor_email().to_lowercase().contains(&term)
                || visit.visit.purpose.to_lowercase().contains(&term)
        })
        .collect()
}

fn approval_pass(visit: &VisitDetails) -> VisitPass {
    VisitPass {
        name: Some(visit.visitor_name().to_string()),
        email: Some(visit.visitor_email().to_string()),
        purpose: Some(visit.visit.purpose.clone()),
        valid_until: Some(visit.visit.valid_until.to_rfc3339()),
        ..VisitPass::new(visit.visit.id)
    }
}
