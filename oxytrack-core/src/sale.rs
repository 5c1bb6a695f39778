//! Sales: recording deliveries, tracking bottle recovery, client names.

use chrono::{DateTime, Utc};

use crate::models::{ClientType, SaleEntry};
use crate::store::{StoreError, StoreResult, SyncStore};
use crate::validation::{validate_client_name, validate_recipient, ValidationError, ValidationResult};

/// Fields of the sale form.
#[derive(Debug, Clone)]
pub struct SaleForm {
    pub sale_date: DateTime<Utc>,
    pub client_type: ClientType,
    pub client_name: String,
    pub recipient_name: String,
    pub our_bottles_count: u32,
    pub client_bottles_count: u32,
    pub bottle_numbers: String,
}

impl SaleForm {
    fn validate(&self) -> ValidationResult<String> {
        let client_name = validate_client_name(&self.client_name)?;
        validate_recipient(self.client_type, &self.recipient_name)?;
        Ok(client_name)
    }

    /// Builds a new pending sale.
    pub fn into_entry(self) -> ValidationResult<SaleEntry> {
        let client_name = self.validate()?;
        Ok(
            SaleEntry::new(self.sale_date, self.client_type, client_name, self.our_bottles_count)
                .with_recipient(self.recipient_name.trim())
                .with_client_bottles(self.client_bottles_count)
                .with_bottle_numbers(self.bottle_numbers.trim()),
        )
    }

    /// Overwrites the editable fields of `entry`. Id and status are kept.
    fn apply_to(self, entry: &mut SaleEntry) -> ValidationResult<()> {
        let client_name = self.validate()?;
        entry.sale_date = self.sale_date;
        entry.client_type = self.client_type;
        entry.client_name = client_name;
        entry.recipient_name = self.recipient_name.trim().to_string();
        entry.our_bottles_count = self.our_bottles_count;
        entry.client_bottles_count = self.client_bottles_count;
        entry.bottle_numbers = self.bottle_numbers.trim().to_string();
        entry.touch();
        Ok(())
    }
}

/// Keeps the sales matching a recovery state.
pub fn filter_sales(sales: &[SaleEntry], completed: bool) -> Vec<SaleEntry> {
    sales
        .iter()
        .filter(|s| s.is_completed() == completed)
        .cloned()
        .collect()
}

/// Distinct client names, sorted.
pub fn client_names(sales: &[SaleEntry]) -> Vec<String> {
    let mut names: Vec<String> = sales.iter().map(|s| s.client_name.clone()).collect();
    names.sort();
    names.dedup();
    names
}

impl SyncStore {
    /// Records a new sale. New sales always start pending.
    pub fn record_sale(&self, form: SaleForm) -> StoreResult<SaleEntry> {
        let sale = form.into_entry()?;
        let created = sale.clone();

        self.try_modify(move |sales: &mut Vec<SaleEntry>| {
            sales.push(sale);
            Ok(())
        })?;

        tracing::info!("Recorded sale {} for {}", created.id, created.client_name);
        Ok(created)
    }

    pub fn update_sale(&self, id: &str, form: SaleForm) -> StoreResult<SaleEntry> {
        self.modify_sale(id, |sale| form.apply_to(sale).map_err(StoreError::from))
    }

    /// Marks the client's bottles as returned.
    pub fn mark_recovered(&self, id: &str) -> StoreResult<SaleEntry> {
        self.modify_sale(id, |sale| {
            sale.mark_recovered();
            Ok(())
        })
    }

    pub fn client_names(&self) -> Vec<String> {
        client_names(&self.sale_entries())
    }

    /// Renames a client on every sale. Returns how many sales changed.
    pub fn rename_client(&self, old_name: &str, new_name: &str) -> StoreResult<usize> {
        let new_name = validate_client_name(new_name)?;

        let renamed = self.try_modify(|sales: &mut Vec<SaleEntry>| {
            if new_name != old_name && sales.iter().any(|s| s.client_name == new_name) {
                return Err(ValidationError::DuplicateClient(new_name.clone()).into());
            }
            let mut renamed = 0;
            for sale in sales.iter_mut().filter(|s| s.client_name == old_name) {
                sale.client_name = new_name.clone();
                sale.touch();
                renamed += 1;
            }
            Ok(renamed)
        })?;

        tracing::info!("Renamed client '{}' to '{}' on {} sale(s)", old_name, new_name, renamed);
        Ok(renamed)
    }

    fn modify_sale<F>(&self, id: &str, f: F) -> StoreResult<SaleEntry>
    where
        F: FnOnce(&mut SaleEntry) -> StoreResult<()>,
    {
        self.try_modify(|sales: &mut Vec<SaleEntry>| {
            let sale = sales
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| StoreError::SaleNotFound(id.to_string()))?;
            f(sale)?;
            Ok(sale.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocalCache;
    use crate::models::SaleStatus;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn store() -> (SyncStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SyncStore::open(LocalCache::new(temp_dir.path()), None);
        (store, temp_dir)
    }

    fn hospital_form(recipient: &str) -> SaleForm {
        SaleForm {
            sale_date: Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
            client_type: ClientType::Hospital,
            client_name: "HGR Kinshasa".to_string(),
            recipient_name: recipient.to_string(),
            our_bottles_count: 12,
            client_bottles_count: 0,
            bottle_numbers: String::new(),
        }
    }

    fn company_form(name: &str) -> SaleForm {
        SaleForm {
            client_type: ClientType::Company,
            client_name: name.to_string(),
            recipient_name: String::new(),
            client_bottles_count: 3,
            ..hospital_form("")
        }
    }

    #[test]
    fn test_hospital_sale_without_recipient_is_rejected() {
        let (store, _temp) = store();
        let result = store.record_sale(hospital_form(""));
        assert!(matches!(
            result,
            Err(StoreError::Validation(ValidationError::MissingRecipient))
        ));
        assert!(store.sale_entries().is_empty());
    }

    #[test]
    fn test_record_sale_is_pending() {
        let (store, _temp) = store();
        let sale = store.record_sale(hospital_form("Dr. Mbala")).unwrap();
        assert_eq!(sale.status, SaleStatus::Pending);
        assert_eq!(store.sale_entries(), vec![sale]);
    }

    #[test]
    fn test_mark_recovered() {
        let (store, _temp) = store();
        let sale = store.record_sale(company_form("Mining")).unwrap();

        let recovered = store.mark_recovered(&sale.id).unwrap();
        assert!(recovered.is_completed());
        assert!(store.sale_entry(&sale.id).unwrap().is_completed());

        assert!(matches!(
            store.mark_recovered("missing"),
            Err(StoreError::SaleNotFound(_))
        ));
    }

    #[test]
    fn test_update_sale_keeps_status() {
        let (store, _temp) = store();
        let sale = store.record_sale(company_form("Mining")).unwrap();
        store.mark_recovered(&sale.id).unwrap();

        let updated = store
            .update_sale(
                &sale.id,
                SaleForm {
                    our_bottles_count: 20,
                    ..company_form("Mining")
                },
            )
            .unwrap();
        assert_eq!(updated.our_bottles_count, 20);
        assert!(updated.is_completed());
        assert_eq!(updated.id, sale.id);
    }

    #[test]
    fn test_filter_sales() {
        let (store, _temp) = store();
        let a = store.record_sale(company_form("A")).unwrap();
        store.record_sale(company_form("B")).unwrap();
        store.mark_recovered(&a.id).unwrap();

        let sales = store.sale_entries();
        assert_eq!(filter_sales(&sales, true).len(), 1);
        assert_eq!(filter_sales(&sales, false)[0].client_name, "B");
    }

    #[test]
    fn test_rename_client() {
        let (store, _temp) = store();
        store.record_sale(company_form("Minig")).unwrap();
        store.record_sale(company_form("Minig")).unwrap();
        store.record_sale(company_form("Other")).unwrap();

        assert_eq!(store.rename_client("Minig", " Mining ").unwrap(), 2);
        assert_eq!(store.client_names(), vec!["Mining", "Other"]);
    }

    #[test]
    fn test_rename_client_rejects_collision_and_empty() {
        let (store, _temp) = store();
        store.record_sale(company_form("A")).unwrap();
        store.record_sale(company_form("B")).unwrap();

        assert!(matches!(
            store.rename_client("A", "B"),
            Err(StoreError::Validation(ValidationError::DuplicateClient(_)))
        ));
        assert!(matches!(
            store.rename_client("A", "  "),
            Err(StoreError::Validation(ValidationError::Required(_)))
        ));
        assert_eq!(store.client_names(), vec!["A", "B"]);
    }
}
