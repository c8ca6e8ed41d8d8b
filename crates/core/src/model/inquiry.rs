//! Bulk/custom inquiry rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{InquiryId, InquiryStatus, UserId};

/// An inquiry as stored in the `inquiries` table.
///
/// Created with status `pending`; afterwards only the status moves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Inquiry {
    pub id: InquiryId,
    pub user_id: UserId,
    /// Who is asking: "homeowner", "electrician", "builder", ...
    pub requester_type: String,
    /// Free-text description of what is needed.
    pub requirements: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert body for a new inquiry. The repository forces status `pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInquiry {
    pub user_id: UserId,
    pub requester_type: String,
    pub requirements: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
