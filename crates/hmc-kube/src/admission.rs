//! Admission review handling for template objects
//!
//! Translates `admission.k8s.io/v1` reviews into deletion guard calls.
//! Only DELETE is checked; create and update are admitted unchanged.

use hmc_core::TemplateKind;
use kube::api::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use tracing::{debug, warn};

use crate::guard::{DeletionGuard, Verdict};
use crate::store::ClusterStore;

/// Answer an admission review for a template object
pub async fn review_template<S: ClusterStore>(
    guard: &DeletionGuard<S>,
    review: AdmissionReview<DynamicObject>,
) -> AdmissionReview<DynamicObject> {
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "malformed admission review");
            return AdmissionResponse::invalid(e.to_string()).into_review();
        }
    };

    decide(guard, &request).await.into_review()
}

/// Build the response for a single admission request
pub async fn decide<S: ClusterStore>(
    guard: &DeletionGuard<S>,
    request: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);
    if !matches!(request.operation, Operation::Delete) {
        return response;
    }

    let Some(kind) = TemplateKind::from_kind(&request.kind.kind) else {
        return response.deny(format!("unsupported kind {}", request.kind.kind));
    };

    debug!(%kind, name = %request.name, "validating template deletion");
    match guard.check_no_consumers(kind, &request.name).await {
        Ok(Verdict::Allowed { warnings }) => with_warnings(response, warnings),
        Ok(Verdict::Denied { warnings, reason }) => with_warnings(response.deny(reason), warnings),
        Err(e) => {
            warn!(%kind, name = %request.name, error = %e, "consumer lookup failed");
            response.deny(e.to_string())
        }
    }
}

fn with_warnings(mut response: AdmissionResponse, warnings: Vec<String>) -> AdmissionResponse {
    if !warnings.is_empty() {
        response.warnings = Some(warnings);
    }
    response
}
