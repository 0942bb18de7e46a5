//! Upstream adapters.
//!
//! One adapter per group of endpoints on a backend. Every method follows the
//! same template: substitute path parameters, build the query map (empty
//! values omitted), call the upstream's `BaseApiClient`, decode the
//! envelope. A non-2xx answer with a decodable envelope is `Ok`; errors are
//! reserved for transport, codec and breaker failures and are never
//! translated here.
//!
//! # Data Flow
//! ```text
//! edge handler
//!     → adapter method (account.rs, crm.rs, logistics.rs, purchase.rs, task.rs)
//!     → client::BaseApiClient (one per upstream, shared)
//!     → transport::ResilientTransport (one per upstream, shared)
//! ```

pub mod account;
pub mod crm;
pub mod logistics;
pub mod purchase;
pub mod task;

pub use account::{OrganizationAdapter, UserAdapter};
pub use crm::{CustomerAdapter, LeadAdapter};
pub use logistics::ShipmentAdapter;
pub use purchase::PurchaseOrderAdapter;
pub use task::TaskAdapter;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{BaseApiClient, ClientError, HttpResponse, QueryParams};
use crate::config::UpstreamsConfig;
use crate::envelope::BaseResponse;
use crate::resilience::BreakerSnapshot;
use crate::transport::ResilientTransport;

/// What every adapter method returns.
pub type AdapterResult<T = Value> = Result<BaseResponse<T>, ClientError>;

pub(crate) fn envelope(response: HttpResponse) -> AdapterResult {
    response.decode_envelope()
}

/// Builds a query map, dropping empty values.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    params: QueryParams,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.params.insert(key.to_string(), value);
        }
        self
    }

    pub fn opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    pub fn build(self) -> QueryParams {
        self.params
    }
}

/// Pagination and free-text search shared by list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ListQuery {
    pub fn to_query(&self) -> QueryBuilder {
        QueryBuilder::new()
            .opt("page", self.page)
            .opt("page_size", self.page_size)
            .opt("search", self.search.as_deref())
    }
}

/// Every adapter, wired once at startup.
#[derive(Debug, Clone)]
pub struct Upstreams {
    pub organizations: OrganizationAdapter,
    pub users: UserAdapter,
    pub customers: CustomerAdapter,
    pub leads: LeadAdapter,
    pub shipments: ShipmentAdapter,
    pub purchase_orders: PurchaseOrderAdapter,
    pub tasks: TaskAdapter,
    clients: Vec<BaseApiClient>,
}

impl Upstreams {
    /// Build one resilient transport and one client per upstream.
    pub fn from_config(config: &UpstreamsConfig) -> Result<Self, ClientError> {
        let client = |name: &str, upstream: &crate::config::UpstreamConfig| {
            BaseApiClient::new(upstream.base_url(), ResilientTransport::new(name, upstream))
        };

        Ok(Self::from_clients(
            client("account", &config.account)?,
            client("crm", &config.crm)?,
            client("logistics", &config.logistics)?,
            client("purchase", &config.purchase)?,
            client("task", &config.task)?,
        ))
    }

    pub fn from_clients(
        account: BaseApiClient,
        crm: BaseApiClient,
        logistics: BaseApiClient,
        purchase: BaseApiClient,
        task: BaseApiClient,
    ) -> Self {
        Self {
            organizations: OrganizationAdapter::new(account.clone()),
            users: UserAdapter::new(account.clone()),
            customers: CustomerAdapter::new(crm.clone()),
            leads: LeadAdapter::new(crm.clone()),
            shipments: ShipmentAdapter::new(logistics.clone()),
            purchase_orders: PurchaseOrderAdapter::new(purchase.clone()),
            tasks: TaskAdapter::new(task.clone()),
            clients: vec![account, crm, logistics, purchase, task],
        }
    }

    /// Breaker state of every upstream, in configuration order.
    pub fn breaker_snapshots(&self) -> Vec<BreakerSnapshot> {
        self.clients
            .iter()
            .map(|client| client.transport().breaker().snapshot())
            .collect()
    }
}
