//! What a payment is for, and what it unlocks once settled.

use serde::{Deserialize, Serialize};

use super::PaymentError;
use crate::domain::foundation::PropertyId;

/// Largest amount accepted for a free-form charge, in cents.
pub const ADHOC_MAX_CENTS: i64 = 10_000_000;

/// The thing being paid for.
///
/// Each variant carries exactly the fields it needs; prices are never part
/// of a purpose except for `Adhoc`, which is reserved for trusted callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentPurpose {
    Subscription {
        plan: String,
    },
    Boost {
        boost_type: String,
        property_id: PropertyId,
    },
    ListingFee {
        tier: String,
    },
    Adhoc {
        amount_cents: i64,
        description: String,
    },
}

impl PaymentPurpose {
    pub fn kind(&self) -> &'static str {
        match self {
            PaymentPurpose::Subscription { .. } => "subscription",
            PaymentPurpose::Boost { .. } => "boost",
            PaymentPurpose::ListingFee { .. } => "listing_fee",
            PaymentPurpose::Adhoc { .. } => "adhoc",
        }
    }

    /// Checks the fields of the variant are usable together.
    pub fn validate(&self) -> Result<(), PaymentError> {
        match self {
            PaymentPurpose::Subscription { plan } if plan.trim().is_empty() => {
                Err(PaymentError::invalid_purpose("subscription requires a plan"))
            }
            PaymentPurpose::Boost { boost_type, .. } if boost_type.trim().is_empty() => {
                Err(PaymentError::invalid_purpose("boost requires a boost type"))
            }
            PaymentPurpose::ListingFee { tier } if tier.trim().is_empty() => {
                Err(PaymentError::invalid_purpose("listing fee requires a tier"))
            }
            PaymentPurpose::Adhoc {
                amount_cents,
                description,
            } => {
                if *amount_cents <= 0 || *amount_cents > ADHOC_MAX_CENTS {
                    return Err(PaymentError::invalid_purpose(format!(
                        "adhoc amount must be between 1 and {} cents",
                        ADHOC_MAX_CENTS
                    )));
                }
                if description.trim().is_empty() {
                    return Err(PaymentError::invalid_purpose(
                        "adhoc payment requires a description",
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Loosely-typed purpose as it arrives from a client.
///
/// Converted into a `PaymentPurpose` before anything else looks at it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurposeRequest {
    pub kind: String,
    pub plan: Option<String>,
    pub boost_type: Option<String>,
    pub property_id: Option<i64>,
    pub tier: Option<String>,
    pub amount_cents: Option<i64>,
    pub description: Option<String>,
}

impl PurposeRequest {
    /// Builds the typed purpose, rejecting missing or foreign fields.
    ///
    /// `allow_adhoc` is false for public callers.
    pub fn into_purpose(self, allow_adhoc: bool) -> Result<PaymentPurpose, PaymentError> {
        let purpose = match self.kind.as_str() {
            "subscription" => {
                self.reject_present(&["boost_type", "property_id", "tier", "amount_cents"])?;
                PaymentPurpose::Subscription {
                    plan: required(self.plan, "subscription", "plan")?,
                }
            }
            "boost" => {
                self.reject_present(&["plan", "tier", "amount_cents"])?;
                let raw_property = self.property_id.ok_or_else(|| {
                    PaymentError::invalid_purpose("boost requires a property_id")
                })?;
                let property_id = PropertyId::new(raw_property)
                    .map_err(|e| PaymentError::invalid_purpose(e.to_string()))?;
                PaymentPurpose::Boost {
                    boost_type: required(self.boost_type, "boost", "boost_type")?,
                    property_id,
                }
            }
            "listing_fee" => {
                self.reject_present(&["plan", "boost_type", "property_id", "amount_cents"])?;
                PaymentPurpose::ListingFee {
                    tier: required(self.tier, "listing_fee", "tier")?,
                }
            }
            "adhoc" if allow_adhoc => {
                self.reject_present(&["plan", "boost_type", "property_id", "tier"])?;
                PaymentPurpose::Adhoc {
                    amount_cents: self.amount_cents.ok_or_else(|| {
                        PaymentError::invalid_purpose("adhoc requires amount_cents")
                    })?,
                    description: required(self.description, "adhoc", "description")?,
                }
            }
            other => return Err(PaymentError::unknown_purpose(other)),
        };

        purpose.validate()?;
        Ok(purpose)
    }

    fn reject_present(&self, fields: &[&'static str]) -> Result<(), PaymentError> {
        for field in fields {
            let present = match *field {
                "plan" => self.plan.is_some(),
                "boost_type" => self.boost_type.is_some(),
                "property_id" => self.property_id.is_some(),
                "tier" => self.tier.is_some(),
                "amount_cents" => self.amount_cents.is_some(),
                _ => false,
            };
            if present {
                return Err(PaymentError::invalid_purpose(format!(
                    "'{}' is not valid for a {} payment",
                    field, self.kind
                )));
            }
        }
        Ok(())
    }
}

fn required(value: Option<String>, kind: &str, field: &str) -> Result<String, PaymentError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| PaymentError::invalid_purpose(format!("{} requires {}", kind, field)))
}

/// Snapshot of what a settled payment grants, frozen at creation time.
///
/// Stored as the intent's metadata so later catalog edits never change
/// what an already-paid intent unlocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "grant", rename_all = "snake_case")]
pub enum EntitlementSpec {
    Subscription {
        plan: String,
        price_monthly: i64,
        period_days: i64,
    },
    Boost {
        boost_type: String,
        property_id: PropertyId,
        duration_days: i64,
        featured: bool,
    },
    ListingQuota {
        tier: String,
        slots: i32,
    },
    /// Nothing to activate beyond the invoice.
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: &str) -> PurposeRequest {
        PurposeRequest {
            kind: kind.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn boost_without_property_is_invalid() {
        let req = PurposeRequest {
            boost_type: Some("spotlight".into()),
            ..request("boost")
        };
        assert!(matches!(
            req.into_purpose(false),
            Err(PaymentError::InvalidPurpose(_))
        ));
    }

    #[test]
    fn boost_with_property_parses() {
        let req = PurposeRequest {
            boost_type: Some("spotlight".into()),
            property_id: Some(42),
            ..request("boost")
        };
        let purpose = req.into_purpose(false).unwrap();
        assert_eq!(
            purpose,
            PaymentPurpose::Boost {
                boost_type: "spotlight".into(),
                property_id: PropertyId::new(42).unwrap(),
            }
        );
    }

    #[test]
    fn subscription_with_foreign_field_is_invalid() {
        let req = PurposeRequest {
            plan: Some("premium".into()),
            property_id: Some(42),
            ..request("subscription")
        };
        assert!(matches!(
            req.into_purpose(false),
            Err(PaymentError::InvalidPurpose(_))
        ));
    }

    #[test]
    fn client_supplied_amount_is_rejected_for_catalog_purposes() {
        let req = PurposeRequest {
            plan: Some("premium".into()),
            amount_cents: Some(1),
            ..request("subscription")
        };
        assert!(req.into_purpose(false).is_err());
    }

    #[test]
    fn unknown_kind_is_unknown_purpose() {
        assert!(matches!(
            request("donation").into_purpose(false),
            Err(PaymentError::UnknownPurpose(_))
        ));
    }

    #[test]
    fn adhoc_is_closed_to_public_callers() {
        let req = PurposeRequest {
            amount_cents: Some(500),
            description: Some("Manual top-up".into()),
            ..request("adhoc")
        };
        assert!(matches!(
            req.clone().into_purpose(false),
            Err(PaymentError::UnknownPurpose(_))
        ));
        assert!(req.into_purpose(true).is_ok());
    }

    #[test]
    fn adhoc_amount_must_be_positive() {
        let purpose = PaymentPurpose::Adhoc {
            amount_cents: 0,
            description: "nothing".into(),
        };
        assert!(purpose.validate().is_err());
    }

    #[test]
    fn purpose_serializes_with_kind_tag() {
        let purpose = PaymentPurpose::ListingFee {
            tier: "standard".into(),
        };
        let json = serde_json::to_value(&purpose).unwrap();
        assert_eq!(json["kind"], "listing_fee");
        assert_eq!(json["tier"], "standard");
    }
}
