//! Static price list for everything that can be bought.
//!
//! The catalog is the only source of amounts for catalog purposes; nothing
//! a client sends can change a price.

use std::collections::HashMap;

use super::{EntitlementSpec, PaymentError, PaymentPurpose};

/// Subscription billing period in days.
pub const BILLING_PERIOD_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPlanOffer {
    pub key: &'static str,
    pub display_name: &'static str,
    pub price_monthly: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoostOffer {
    pub key: &'static str,
    pub display_name: &'static str,
    pub price: i64,
    pub duration_days: i64,
    /// Whether the boosted property is flagged as featured.
    pub featured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFeeOffer {
    pub key: &'static str,
    pub display_name: &'static str,
    pub price: i64,
    pub listing_slots: i32,
}

/// Lookup from symbolic keys to prices and entitlement parameters.
#[derive(Debug, Clone)]
pub struct Catalog {
    plans: HashMap<&'static str, SubscriptionPlanOffer>,
    boosts: HashMap<&'static str, BoostOffer>,
    listing_fees: HashMap<&'static str, ListingFeeOffer>,
}

impl Catalog {
    /// The production price list. All amounts in cents.
    pub fn standard() -> Self {
        let plans = [
            SubscriptionPlanOffer {
                key: "basic",
                display_name: "Basic plan",
                price_monthly: 4_900,
            },
            SubscriptionPlanOffer {
                key: "premium",
                display_name: "Premium plan",
                price_monthly: 9_900,
            },
            SubscriptionPlanOffer {
                key: "agency",
                display_name: "Agency plan",
                price_monthly: 24_900,
            },
        ];
        let boosts = [
            BoostOffer {
                key: "featured",
                display_name: "Featured boost",
                price: 4_900,
                duration_days: 7,
                featured: true,
            },
            BoostOffer {
                key: "spotlight",
                display_name: "Spotlight boost",
                price: 9_900,
                duration_days: 14,
                featured: true,
            },
            BoostOffer {
                key: "top_of_search",
                display_name: "Top of search",
                price: 2_900,
                duration_days: 7,
                featured: false,
            },
        ];
        let listing_fees = [
            ListingFeeOffer {
                key: "standard",
                display_name: "Standard listing",
                price: 1_500,
                listing_slots: 1,
            },
            ListingFeeOffer {
                key: "bundle",
                display_name: "Listing bundle",
                price: 5_000,
                listing_slots: 5,
            },
        ];

        Self {
            plans: plans.into_iter().map(|p| (p.key, p)).collect(),
            boosts: boosts.into_iter().map(|b| (b.key, b)).collect(),
            listing_fees: listing_fees.into_iter().map(|l| (l.key, l)).collect(),
        }
    }

    pub fn plan(&self, key: &str) -> Result<&SubscriptionPlanOffer, PaymentError> {
        self.plans
            .get(key)
            .ok_or_else(|| PaymentError::unknown_purpose(format!("subscription plan '{}'", key)))
    }

    pub fn boost(&self, key: &str) -> Result<&BoostOffer, PaymentError> {
        self.boosts
            .get(key)
            .ok_or_else(|| PaymentError::unknown_purpose(format!("boost type '{}'", key)))
    }

    pub fn listing_fee(&self, key: &str) -> Result<&ListingFeeOffer, PaymentError> {
        self.listing_fees
            .get(key)
            .ok_or_else(|| PaymentError::unknown_purpose(format!("listing tier '{}'", key)))
    }

    /// Amount to charge for a purpose, in cents.
    pub fn price_of(&self, purpose: &PaymentPurpose) -> Result<i64, PaymentError> {
        match purpose {
            PaymentPurpose::Subscription { plan } => Ok(self.plan(plan)?.price_monthly),
            PaymentPurpose::Boost { boost_type, .. } => Ok(self.boost(boost_type)?.price),
            PaymentPurpose::ListingFee { tier } => Ok(self.listing_fee(tier)?.price),
            PaymentPurpose::Adhoc { amount_cents, .. } => Ok(*amount_cents),
        }
    }

    /// Parameters the activator needs once the purpose is paid for.
    pub fn entitlement_of(&self, purpose: &PaymentPurpose) -> Result<EntitlementSpec, PaymentError> {
        match purpose {
            PaymentPurpose::Subscription { plan } => {
                let offer = self.plan(plan)?;
                Ok(EntitlementSpec::Subscription {
                    plan: offer.key.to_string(),
                    price_monthly: offer.price_monthly,
                    period_days: BILLING_PERIOD_DAYS,
                })
            }
            PaymentPurpose::Boost {
                boost_type,
                property_id,
            } => {
                let offer = self.boost(boost_type)?;
                Ok(EntitlementSpec::Boost {
                    boost_type: offer.key.to_string(),
                    property_id: *property_id,
                    duration_days: offer.duration_days,
                    featured: offer.featured,
                })
            }
            PaymentPurpose::ListingFee { tier } => {
                let offer = self.listing_fee(tier)?;
                Ok(EntitlementSpec::ListingQuota {
                    tier: offer.key.to_string(),
                    slots: offer.listing_slots,
                })
            }
            PaymentPurpose::Adhoc { .. } => Ok(EntitlementSpec::None),
        }
    }

    /// Human-readable line used for invoices and the bank reference.
    pub fn description_of(&self, purpose: &PaymentPurpose) -> Result<String, PaymentError> {
        match purpose {
            PaymentPurpose::Subscription { plan } => Ok(self.plan(plan)?.display_name.to_string()),
            PaymentPurpose::Boost {
                boost_type,
                property_id,
            } => Ok(format!(
                "{} property {}",
                self.boost(boost_type)?.display_name,
                property_id
            )),
            PaymentPurpose::ListingFee { tier } => {
                Ok(self.listing_fee(tier)?.display_name.to_string())
            }
            PaymentPurpose::Adhoc { description, .. } => Ok(description.clone()),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
