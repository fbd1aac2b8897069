//! Verification model -> entity mapper

use relay_core::entities::VerificationRecord;
use relay_core::value_objects::UserId;

use crate::models::VerificationModel;

impl From<VerificationModel> for VerificationRecord {
    fn from(model: VerificationModel) -> Self {
        VerificationRecord {
            user_id: UserId::new(model.userid),
            code: model.code,
            expires_at: model.expires_at,
            verified: model.verified,
        }
    }
}
