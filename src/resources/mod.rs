//! Typed descriptions of the API's list resources.
//!
//! A [`Resource`] ties a [`ResourceDescriptor`] (cache prefix, endpoint
//! path, required scope, default sort, dependent prefixes) to the record
//! type its responses decode into. Payloads that don't fit the record type
//! fail at decode time instead of travelling further as untyped JSON.

mod records;

use std::fmt::Debug;

use serde::de::DeserializeOwned;

use crate::query::Sort;

pub use records::{
    Bill, Budget, CustomerTransaction, Invoice, InvoiceStatus, KycStatus, PayrollRun, Vendor,
};

/// Static facts about one REST collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Cache prefix and display name (e.g. "invoices").
    pub name: String,
    /// Endpoint path relative to the API base URL (e.g. "invoices").
    pub path: String,
    /// Scope fields that must be present before any list fetch.
    pub required_scope: Vec<String>,
    /// Sort used when a screen initializes without one.
    pub default_sort: Sort,
    /// Other prefixes invalidated after a successful write.
    pub invalidates: Vec<String>,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            required_scope: Vec::new(),
            default_sort: Sort::default(),
            invalidates: Vec::new(),
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn requires(mut self, field: impl Into<String>) -> Self {
        self.required_scope.push(field.into());
        self
    }

    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.default_sort = sort;
        self
    }

    pub fn also_invalidates(mut self, prefix: impl Into<String>) -> Self {
        self.invalidates.push(prefix.into());
        self
    }

    /// Every prefix a successful write to this resource makes stale.
    pub fn invalidation_prefixes(&self) -> Vec<String> {
        let mut prefixes = Vec::with_capacity(1 + self.invalidates.len());
        prefixes.push(self.name.clone());
        for prefix in &self.invalidates {
            if !prefixes.contains(prefix) {
                prefixes.push(prefix.clone());
            }
        }
        prefixes
    }
}

/// A REST collection with a typed record.
pub trait Resource: Send + Sync + 'static {
    type Record: DeserializeOwned + Clone + PartialEq + Debug + Send + Sync + 'static;

    fn descriptor(&self) -> ResourceDescriptor;
}

/// Resource described at runtime whose records stay as JSON values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dynamic(pub ResourceDescriptor);

impl Resource for Dynamic {
    type Record = serde_json::Value;

    fn descriptor(&self) -> ResourceDescriptor {
        self.0.clone()
    }
}

macro_rules! resource {
    ($(#[$meta:meta])* $name:ident => $record:ty, $descriptor:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Resource for $name {
            type Record = $record;

            fn descriptor(&self) -> ResourceDescriptor {
                $descriptor
            }
        }
    };
}

resource!(
    /// Sales invoices.
    Invoices => Invoice,
    ResourceDescriptor::new("invoices")
);

resource!(
    /// Vendor bills.
    Bills => Bill,
    ResourceDescriptor::new("bills").sorted_by(Sort::asc("dueDate"))
);

resource!(
    Budgets => Budget,
    ResourceDescriptor::new("budgets").sorted_by(Sort::desc("fiscalYear"))
);

resource!(
    /// Vendors with their KYC state.
    Vendors => Vendor,
    ResourceDescriptor::new("vendors").sorted_by(Sort::asc("name"))
);

resource!(
    PayrollRuns => PayrollRun,
    ResourceDescriptor::new("payroll-runs")
        .path("payroll/runs")
        .sorted_by(Sort::desc("periodEnd"))
        .also_invalidates("budgets")
);

resource!(
    /// Payments and adjustments on one customer's account. Listing needs a
    /// `customerId`; writes also touch the invoices they settle.
    CustomerTransactions => CustomerTransaction,
    ResourceDescriptor::new("customer-transactions")
        .path("customers/transactions")
        .requires("customerId")
        .also_invalidates("invoices")
);

/// Descriptors of every built-in resource.
pub fn builtin() -> Vec<ResourceDescriptor> {
    vec![
        Invoices.descriptor(),
        Bills.descriptor(),
        Budgets.descriptor(),
        Vendors.descriptor(),
        PayrollRuns.descriptor(),
        CustomerTransactions.descriptor(),
    ]
}

/// Look up a built-in resource by name.
pub fn find(name: &str) -> Option<ResourceDescriptor> {
    builtin().into_iter().find(|d| d.name == name)
}
