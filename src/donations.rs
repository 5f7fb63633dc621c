//! Donation intake. Records land in the `donations` collection and are
//! mirrored to the donation audit file in the original receipt layout.

use crate::audit::{AuditFile, AuditLog};
use crate::error::{PortalError, PortalResult};
use crate::store::collection::{Collection, IdStrategy};
use crate::store::models::DonationRecord;
use crate::store::SharedStore;

const DONATIONS_COLLECTION: &str = "donations";

#[derive(Debug, Clone)]
pub struct NewDonation {
    pub amount: String,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub bitcoin_address: String,
    pub anonymous: bool,
    pub newsletter: bool,
}

#[derive(Clone)]
pub struct DonationService {
    donations: Collection<DonationRecord>,
    audit: AuditLog,
}

impl DonationService {
    pub fn new(store: SharedStore) -> Self {
        let donations = Collection::new(store.clone(), DONATIONS_COLLECTION, IdStrategy::Timestamped);
        let audit = AuditLog::new(store);
        Self { donations, audit }
    }

    pub fn record(&self, input: NewDonation) -> PortalResult<DonationRecord> {
        if input.amount.trim().is_empty() || input.amount.trim().parse::<f64>().is_err() {
            return Err(PortalError::Validation(
                "Please enter a valid donation amount".to_string(),
            ));
        }

        let donation = self.donations.upsert(DonationRecord {
            id: None,
            amount: input.amount.trim().to_string(),
            currency: "BTC".to_string(),
            donor_name: input.donor_name,
            donor_email: input.donor_email,
            bitcoin_address: input.bitcoin_address,
            anonymous: input.anonymous,
            newsletter: input.newsletter,
            timestamp: String::new(),
        })?;

        let fields = [
            ("Amount", format!("{} BTC", donation.amount)),
            (
                "Donor Name",
                donation
                    .donor_name
                    .clone()
                    .unwrap_or_else(|| "Anonymous".to_string()),
            ),
            (
                "Donor Email",
                donation
                    .donor_email
                    .clone()
                    .unwrap_or_else(|| "Not provided".to_string()),
            ),
            ("Bitcoin Address", donation.bitcoin_address.clone()),
            ("Anonymous", yes_no(donation.anonymous)),
            ("Newsletter", yes_no(donation.newsletter)),
        ];
        if let Err(err) = self.audit.append(&AuditFile::Donations, &fields) {
            tracing::warn!(error = ?err, "audit append failed");
        }

        Ok(donation)
    }

    pub fn list(&self) -> Vec<DonationRecord> {
        self.donations.load()
    }
}

fn yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service_with_store() -> (DonationService, AuditLog) {
        let store = MemoryStore::shared();
        (DonationService::new(store.clone()), AuditLog::new(store))
    }

    fn donation(amount: &str) -> NewDonation {
        NewDonation {
            amount: amount.to_string(),
            donor_name: None,
            donor_email: None,
            bitcoin_address: "bc1qexampleaddress".to_string(),
            anonymous: true,
            newsletter: false,
        }
    }

    #[test]
    fn donation_is_recorded_and_mirrored() {
        let (donations, audit) = service_with_store();
        let record = donations.record(donation("0.005")).unwrap();

        assert_eq!(record.currency, "BTC");
        assert!(!record.timestamp.is_empty());
        assert_eq!(donations.list().len(), 1);

        let blob = audit.read(&AuditFile::Donations).expect("audit blob");
        assert!(blob.contains("New Donation Received"));
        assert!(blob.contains("Amount: 0.005 BTC"));
        assert!(blob.contains("Donor Name: Anonymous"));
        assert!(blob.contains("Donor Email: Not provided"));
        assert!(blob.contains("Anonymous: Yes"));
        assert!(blob.contains("Newsletter: No"));
    }

    #[test]
    fn non_numeric_amount_is_rejected() {
        let (donations, _) = service_with_store();
        assert!(matches!(
            donations.record(donation("lots")),
            Err(PortalError::Validation(_))
        ));
        assert!(donations.list().is_empty());
    }
}
