//! HTTP implementation of the probe/submit protocol
//!
//! Both endpoints are form-encoded POSTs authorized via the raw token in
//! the `Authorization` header (the remote does not use a Bearer prefix).
//! The listing endpoint is paginated; a single first page of fixed size is
//! requested per probe, which covers every observed section count for one
//! course code.
//!
//! Status classification: 401/403 are credential rejections, any other
//! non-2xx is transport (probe) or a business-rule rejection (submit).

use tracing::debug;

use crate::api::ElectiveApi;
use crate::error::{ProbeError, SubmitError};
use crate::identity;
use crate::types::{Credential, OccupancyReport, SubmitReceipt, Target};

/// Listing page requested per probe. One course code resolves to at most a
/// handful of class instances, so the first page is always sufficient.
const PAGE_NUMBER: &str = "1";
const PAGE_SIZE: &str = "10";

/// HTTP client for one registration service deployment.
pub struct ElectiveClient {
    client: reqwest::Client,
    list_url: String,
    add_url: String,
}

impl ElectiveClient {
    /// Build a client rooted at `base_url` (e.g. the school's
    /// `/xsxk/elective/<school>` prefix). The two endpoint paths are fixed
    /// by the remote service.
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            client,
            list_url: format!("{base}/clazz/list"),
            add_url: format!("{base}/clazz/add"),
        }
    }

    async fn probe_inner(
        &self,
        target: &Target,
        credential: &Credential,
    ) -> Result<Vec<OccupancyReport>, ProbeError> {
        if target.is_blank() {
            return Err(ProbeError::EmptyTarget);
        }
        if credential.is_blank() {
            return Err(ProbeError::EmptyCredential);
        }

        let response = self
            .client
            .post(&self.list_url)
            .header("Authorization", credential.token())
            .header("User-Agent", identity::pick_user_agent())
            .form(&[
                ("teachingClassType", target.class_type.as_str()),
                ("pageNumber", PAGE_NUMBER),
                ("pageSize", PAGE_SIZE),
                ("courseCode", target.course_code.as_str()),
                ("teacherCode", target.teacher_code.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProbeError::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ProbeError::AuthExpired {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(ProbeError::Transport {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProbeError::Network(format!("reading listing body: {e}")))?;

        let reports = parse_rows(&body)?;
        debug!(
            target = %target,
            rows = reports.len(),
            "probe completed"
        );
        Ok(reports)
    }

    async fn submit_inner(
        &self,
        target: &Target,
        report: &OccupancyReport,
        credential: &Credential,
    ) -> Result<SubmitReceipt, SubmitError> {
        let response = self
            .client
            .post(&self.add_url)
            .header("Authorization", credential.token())
            .header("User-Agent", identity::pick_user_agent())
            .form(&[
                ("clazzType", target.class_type.as_str()),
                ("clazzId", report.class_instance_id.as_str()),
                ("secretVal", report.secret_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        if status == 401 || status == 403 {
            return Err(SubmitError::AuthExpired { status });
        }
        if !(200..300).contains(&status) {
            return Err(SubmitError::Rejected { status, body });
        }

        debug!(target = %target, class_instance = %report.class_instance_id, "submission accepted");
        Ok(SubmitReceipt { status, body })
    }
}

impl ElectiveApi for ElectiveClient {
    fn probe<'a>(
        &'a self,
        target: &'a Target,
        credential: &'a Credential,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<OccupancyReport>, ProbeError>> + Send + 'a>,
    > {
        Box::pin(self.probe_inner(target, credential))
    }

    fn submit<'a>(
        &'a self,
        target: &'a Target,
        report: &'a OccupancyReport,
        credential: &'a Credential,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<SubmitReceipt, SubmitError>> + Send + 'a>,
    > {
        Box::pin(self.submit_inner(target, report, credential))
    }
}

/// Listing response envelope: `{"data": {"list": {"rows": [...]}}}`.
///
/// `rows` may be absent when the page is empty; `data` or `list` being
/// absent means the response is not the listing we asked for (commonly an
/// HTML login page served with status 200 after session expiry upstream).
#[derive(serde::Deserialize)]
struct ListEnvelope {
    data: Option<ListData>,
}

#[derive(serde::Deserialize)]
struct ListData {
    list: Option<ListPage>,
}

#[derive(serde::Deserialize)]
struct ListPage {
    rows: Option<Vec<OccupancyReport>>,
}

/// Parse the listing body into occupancy reports.
fn parse_rows(body: &str) -> Result<Vec<OccupancyReport>, ProbeError> {
    let envelope: ListEnvelope = serde_json::from_str(body)
        .map_err(|e| ProbeError::MalformedResponse(format!("not a JSON listing: {e}")))?;

    let page = envelope
        .data
        .ok_or_else(|| ProbeError::MalformedResponse("missing data".into()))?
        .list
        .ok_or_else(|| ProbeError::MalformedResponse("missing data.list".into()))?;

    Ok(page.rows.unwrap_or_default())
}
