//! Best-effort lead notification fan-out.
//!
//! Every public method delivers to the master mailbox and, when the lead's
//! location has a configured recipient, to that mailbox too — and swallows
//! every failure. Lead persistence must never be undone or appear undone by
//! a notification problem, so nothing here returns an error.

use std::sync::Arc;

use doorlead_core::MarketDirectory;
use doorlead_db::LeadRow;
use doorlead_email::ResendClient;

const LEAD_SUBJECT: &str = "New Door Renew Lead";
const UPDATE_SUBJECT: &str = "Additional Information - Door Renew Lead";
const UNKNOWN_FORM_SUBJECT: &str = "⚠️ Unknown Facebook Lead Form - Action Required";

pub struct Notifications {
    client: Option<ResendClient>,
    markets: Arc<MarketDirectory>,
    master_email: String,
    from_email: String,
}

impl Notifications {
    #[must_use]
    pub fn new(
        client: Option<ResendClient>,
        markets: Arc<MarketDirectory>,
        master_email: String,
        from_email: String,
    ) -> Self {
        Self {
            client,
            markets,
            master_email,
            from_email,
        }
    }

    /// Step-one notification for a directly submitted lead.
    pub async fn lead_created(&self, lead: &LeadRow) {
        let content = lead_created_content(lead);
        self.fan_out(lead.location.as_deref(), LEAD_SUBJECT, &content)
            .await;
    }

    /// Follow-up notification after the second step, including image URLs.
    pub async fn lead_updated(&self, lead: &LeadRow) {
        let content = lead_updated_content(lead);
        self.fan_out(lead.location.as_deref(), UPDATE_SUBJECT, &content)
            .await;
    }

    /// Notification for a webhook-ingested lead.
    ///
    /// An unresolved form id downgrades to a warning sent to the master
    /// mailbox only, carrying the raw payload so the form can be mapped.
    pub async fn webhook_lead(
        &self,
        provider: &str,
        lead: &LeadRow,
        form_recognized: bool,
        raw_payload: &serde_json::Value,
    ) {
        if form_recognized {
            let lead_type = lead.lead_type.as_deref().unwrap_or("door");
            let location = lead.location.as_deref().unwrap_or("unknown");
            let subject = format!(
                "New {} Lead - {}",
                lead_type.to_uppercase(),
                location.to_uppercase()
            );
            let content = webhook_lead_content(provider, lead, raw_payload);
            self.fan_out(lead.location.as_deref(), &subject, &content)
                .await;
        } else {
            let content = unrecognized_form_content(lead, raw_payload);
            self.deliver(&self.master_email, UNKNOWN_FORM_SUBJECT, &content)
                .await;
        }
    }

    async fn fan_out(&self, location: Option<&str>, subject: &str, text: &str) {
        self.deliver(&self.master_email, subject, text).await;

        if let Some(addr) = location.and_then(|slug| self.markets.notify_email(slug)) {
            self.deliver(addr, subject, text).await;
        }
    }

    async fn deliver(&self, to: &str, subject: &str, text: &str) {
        let Some(client) = self.client.as_ref() else {
            tracing::debug!(to, subject, "email notifications disabled; dropping message");
            return;
        };

        if let Err(err) = client.send(&self.from_email, to, subject, text).await {
            tracing::warn!(to, subject, error = %err, "notification email failed");
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn or_not_provided(value: Option<&str>) -> &str {
    value.unwrap_or("Not provided")
}

fn or_not_specified(value: Option<&str>) -> &str {
    value.unwrap_or("Not specified")
}

fn lead_created_content(lead: &LeadRow) -> String {
    format!(
        "New Lead from Door Renew Website\n\
         \n\
         Name: {}\n\
         Phone: {}\n\
         Email: {}\n\
         Door Issue: {}\n\
         Location: {}\n\
         \n\
         Submitted at: {}\n",
        lead.first_name,
        lead.phone,
        or_not_provided(lead.email.as_deref()),
        or_not_specified(lead.door_issue.as_deref()),
        or_not_specified(lead.location.as_deref()),
        lead.created_at.to_rfc3339(),
    )
}

fn lead_updated_content(lead: &LeadRow) -> String {
    let images = if lead.image_urls.is_empty() {
        "No images uploaded".to_string()
    } else {
        format!("\n{}", lead.image_urls.join("\n"))
    };
    let updated = lead
        .second_step_at
        .map_or_else(String::new, |t| t.to_rfc3339());

    format!(
        "Additional Information Submitted for Lead\n\
         \n\
         Name: {}\n\
         Phone: {}\n\
         Email: {}\n\
         Door Issue: {}\n\
         Location: {}\n\
         \n\
         Comments: {}\n\
         \n\
         Images: {}\n\
         \n\
         Original Submission: {}\n\
         Updated: {}\n",
        lead.first_name,
        lead.phone,
        or_not_provided(lead.email.as_deref()),
        or_not_specified(lead.door_issue.as_deref()),
        or_not_specified(lead.location.as_deref()),
        lead.comments.as_deref().unwrap_or("No comments provided"),
        images,
        lead.created_at.to_rfc3339(),
        updated,
    )
}

fn webhook_lead_content(provider: &str, lead: &LeadRow, raw_payload: &serde_json::Value) -> String {
    let platform = raw_payload
        .get("platform")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("Facebook");
    let lead_type = lead.lead_type.as_deref().unwrap_or("door");

    format!(
        "New {} Lead from Facebook (via {provider})\n\
         \n\
         Location: {}\n\
         Lead Type: {}\n\
         \n\
         Contact Information:\n\
         Name: {}\n\
         Phone: {}\n\
         Email: {}\n\
         \n\
         Form Details:\n\
         Form ID: {}\n\
         Form Name: {}\n\
         \n\
         Campaign Details:\n\
         Campaign: {}\n\
         Ad: {}\n\
         Platform: {platform}\n\
         \n\
         Submitted at: {}\n",
        lead_type.to_uppercase(),
        lead.location.as_deref().unwrap_or("unknown").to_uppercase(),
        lead_type.to_uppercase(),
        or_not_provided(non_empty(&lead.first_name)),
        or_not_provided(non_empty(&lead.phone)),
        or_not_provided(lead.email.as_deref()),
        or_not_specified(lead.form_id.as_deref()),
        or_not_specified(lead.form_name.as_deref()),
        or_not_specified(lead.campaign_name.as_deref()),
        or_not_specified(lead.ad_name.as_deref()),
        lead.created_at.to_rfc3339(),
    )
}

fn unrecognized_form_content(lead: &LeadRow, raw_payload: &serde_json::Value) -> String {
    let raw = serde_json::to_string_pretty(raw_payload).unwrap_or_default();

    format!(
        "⚠️ WARNING: Unrecognized Facebook Lead Form\n\
         \n\
         Received lead from unknown form ID: {}\n\
         \n\
         Lead Details:\n\
         Name: {}\n\
         Phone: {}\n\
         Email: {}\n\
         \n\
         Form Details:\n\
         Form ID: {}\n\
         Form Name: {}\n\
         \n\
         Campaign Details:\n\
         Campaign: {}\n\
         Ad: {}\n\
         \n\
         Raw Form Data:\n\
         {raw}\n",
        or_not_specified(lead.form_id.as_deref()),
        or_not_provided(non_empty(&lead.first_name)),
        or_not_provided(non_empty(&lead.phone)),
        or_not_provided(lead.email.as_deref()),
        or_not_specified(lead.form_id.as_deref()),
        or_not_specified(lead.form_name.as_deref()),
        or_not_specified(lead.campaign_name.as_deref()),
        or_not_specified(lead.ad_name.as_deref()),
    )
}
