//! Database operations for the `leads` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `leads` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeadRow {
    pub id: Uuid,
    pub first_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub door_issue: Option<String>,
    pub location: Option<String>,
    pub lead_type: Option<String>,
    pub source: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub campaign_name: Option<String>,
    pub ad_name: Option<String>,
    pub form_id: Option<String>,
    pub form_name: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub image_urls: Vec<String>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub second_step_at: Option<DateTime<Utc>>,
}

/// Fields supplied by an ingestion channel at creation time.
///
/// `id` and `created_at` are assigned by the store; `image_urls` and
/// `comments` always start empty and are only written by
/// [`apply_second_step`].
#[derive(Debug, Clone, Default)]
pub struct NewLead {
    pub first_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub door_issue: Option<String>,
    pub location: Option<String>,
    pub lead_type: Option<String>,
    pub source: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub campaign_name: Option<String>,
    pub ad_name: Option<String>,
    pub form_id: Option<String>,
    pub form_name: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Second-step enrichment merged into an existing lead.
#[derive(Debug, Clone, Default)]
pub struct SecondStep {
    pub image_urls: Vec<String>,
    pub comments: Option<String>,
    pub door_issue: Option<String>,
    pub email: Option<String>,
}

const LEAD_COLUMNS: &str = "id, first_name, phone, email, door_issue, location, lead_type, \
     source, utm_source, utm_medium, utm_campaign, campaign_name, ad_name, form_id, form_name, \
     user_agent, ip_address, image_urls, comments, created_at, second_step_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a new lead and returns the full row as stored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_lead(pool: &PgPool, new: &NewLead) -> Result<LeadRow, DbError> {
    let row = sqlx::query_as::<_, LeadRow>(&format!(
        "INSERT INTO leads \
           (first_name, phone, email, door_issue, location, lead_type, source, \
            utm_source, utm_medium, utm_campaign, campaign_name, ad_name, form_id, form_name, \
            user_agent, ip_address) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
         RETURNING {LEAD_COLUMNS}"
    ))
    .bind(&new.first_name)
    .bind(&new.phone)
    .bind(&new.email)
    .bind(&new.door_issue)
    .bind(&new.location)
    .bind(&new.lead_type)
    .bind(&new.source)
    .bind(&new.utm_source)
    .bind(&new.utm_medium)
    .bind(&new.utm_campaign)
    .bind(&new.campaign_name)
    .bind(&new.ad_name)
    .bind(&new.form_id)
    .bind(&new.form_name)
    .bind(&new.user_agent)
    .bind(&new.ip_address)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Returns a lead by primary id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_lead_by_id(pool: &PgPool, id: Uuid) -> Result<Option<LeadRow>, DbError> {
    let row = sqlx::query_as::<_, LeadRow>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Returns the most recently created lead with the given email, or `None`.
///
/// This is the heuristic fallback used when the caller has lost the lead id;
/// if multiple leads share the email, the newest wins.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_latest_lead_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<LeadRow>, DbError> {
    let row = sqlx::query_as::<_, LeadRow>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads \
         WHERE email = $1 \
         ORDER BY created_at DESC \
         LIMIT 1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Merges second-step fields into an existing lead and stamps `second_step_at`.
///
/// `image_urls` and `comments` are overwritten with the supplied values;
/// `door_issue` and `email` are only updated when supplied. A repeated update
/// simply overwrites `second_step_at`. Single `UPDATE … RETURNING` statement,
/// so there is no SELECT/UPDATE race.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no lead with `id` exists, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn apply_second_step(
    pool: &PgPool,
    id: Uuid,
    step: &SecondStep,
) -> Result<LeadRow, DbError> {
    let row = sqlx::query_as::<_, LeadRow>(&format!(
        "UPDATE leads \
         SET image_urls     = $2, \
             comments       = $3, \
             door_issue     = COALESCE($4, door_issue), \
             email          = COALESCE($5, email), \
             second_step_at = NOW() \
         WHERE id = $1 \
         RETURNING {LEAD_COLUMNS}"
    ))
    .bind(id)
    .bind(&step.image_urls)
    .bind(&step.comments)
    .bind(&step.door_issue)
    .bind(&step.email)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}
