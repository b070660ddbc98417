use std::path::Path;
use std::sync::Arc;

use service::address::{AddressProvider, StaticAddressProvider};
use service::audit::{AuditRepository, AuditService};
use service::auth::{AuthConfig, AuthRepository, AuthService};
use service::category::{CategoryRepository, CategoryService};
use service::comment::{CommentRepository, CommentService};
use service::contract::{ContractRepository, ContractService};
use service::events::{EventRepository, EventService};
use service::local_store::LocalStore;
use service::news::{NewsRepository, NewsService};
use service::order::{OrderRepository, OrderService};
use service::product::{ProductRepository, ProductService};
use service::runtime::Repositories;
use service::subscriber::{SubscriberRepository, SubscriberService};

pub type Products = ProductService<dyn ProductRepository, dyn SubscriberRepository>;
pub type Orders = OrderService<dyn OrderRepository, dyn ProductRepository, dyn SubscriberRepository>;
pub type Contracts = ContractService<dyn ContractRepository, dyn ProductRepository, dyn SubscriberRepository>;

/// Shared handler state; every field is a cheap `Arc` clone.
#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService<dyn AuthRepository>>,
    pub categories: Arc<CategoryService<dyn CategoryRepository>>,
    pub news: Arc<NewsService<dyn NewsRepository>>,
    pub events: Arc<EventService<dyn EventRepository>>,
    pub subscribers: Arc<SubscriberService<dyn SubscriberRepository>>,
    pub products: Arc<Products>,
    pub comments: Arc<CommentService<dyn CommentRepository>>,
    pub orders: Arc<Orders>,
    pub contracts: Arc<Contracts>,
    pub audit: Arc<AuditService<dyn AuditRepository>>,
    pub local: Arc<LocalStore>,
    pub address: Arc<dyn AddressProvider>,
}

impl ServerState {
    pub fn new(repos: Repositories, auth: AuthConfig, local: LocalStore, address: Arc<dyn AddressProvider>) -> Self {
        Self {
            auth: Arc::new(AuthService::new(repos.auth, auth)),
            categories: Arc::new(CategoryService::new(repos.categories)),
            news: Arc::new(NewsService::new(repos.news)),
            events: Arc::new(EventService::new(repos.events)),
            subscribers: Arc::new(SubscriberService::new(repos.subscribers.clone())),
            products: Arc::new(ProductService::new(repos.products.clone(), repos.subscribers.clone())),
            comments: Arc::new(CommentService::new(repos.comments)),
            orders: Arc::new(OrderService::new(repos.orders, repos.products.clone(), repos.subscribers.clone())),
            contracts: Arc::new(ContractService::new(repos.contracts, repos.products, repos.subscribers)),
            audit: Arc::new(AuditService::new(repos.audit)),
            local: Arc::new(local),
            address,
        }
    }

    /// In-process backend with a fixed address book; used by tests and demo mode.
    pub async fn in_memory(data_dir: impl AsRef<Path>, auth: AuthConfig) -> anyhow::Result<Self> {
        let local = LocalStore::open(data_dir).await?;
        Ok(Self::new(Repositories::memory(), auth, local, Arc::new(StaticAddressProvider::default())))
    }
}
