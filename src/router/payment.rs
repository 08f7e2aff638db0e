//! Payment confirmation endpoints.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::AppState;
use crate::error::Result;
use crate::mail::Template::PaymentReceipt;
use crate::router::{Message, Valid};
use crate::user::User;

fn invalid_signature() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "signature",
        ValidationError::new("signature")
            .with_message("Payment signature verification failed.".into()),
    );
    errors
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyBody {
    #[validate(length(min = 1))]
    order_id: String,
    #[validate(length(min = 1))]
    payment_id: String,
    #[validate(length(
        equal = 64,
        message = "Signature must be hex-encoded SHA-256."
    ))]
    signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub order_id: String,
    pub payment_id: String,
    pub verified: bool,
}

/// Handler checking a gateway callback signature.
pub async fn verify(
    State(state): State<AppState>,
    Valid(body): Valid<VerifyBody>,
) -> Result<Json<VerifyResponse>> {
    if !state
        .payment
        .verify(&body.order_id, &body.payment_id, &body.signature)
    {
        return Err(invalid_signature().into());
    }

    Ok(Json(VerifyResponse {
        order_id: body.order_id,
        payment_id: body.payment_id,
        verified: true,
    }))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptBody {
    /// Amount paid, in currency subunits.
    #[validate(range(min = 1))]
    amount: u64,
    #[validate(length(min = 1))]
    payment_id: String,
}

/// Handler publishing a payment receipt mail event.
pub async fn receipt(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Valid(body): Valid<ReceiptBody>,
) -> Result<Json<Message>> {
    state
        .mail
        .publish_event(
            PaymentReceipt,
            &user,
            Some(serde_json::json!({
                "amount": body.amount,
                "paymentId": body.payment_id,
            })),
        )
        .await?;

    Ok(Json(Message {
        message: "receipt sent",
    }))
}
