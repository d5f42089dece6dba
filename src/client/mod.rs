//! App-side half of the ordering flow: cart and favorites kept on the
//! device, checkout and coupon rules, and the calls to the order API.

pub mod cart;
pub mod checkout;
pub mod coupons;
pub mod favorites;
pub mod gateway;
pub mod orders;
pub mod payment;
mod persisted;

use std::sync::Arc;

use crate::{
    config::ClientConfig,
    storage::{JsonFileStore, SnapshotStore},
};

use self::{
    cart::CartStore,
    checkout::{CheckoutAssembler, RegularSchedule},
    favorites::FavoritesStore,
    gateway::{HttpOrderGateway, OrderGateway},
    orders::OrdersClient,
    payment::PaymentSubmitter,
};

/// Everything one signed-in user needs, wired to the same snapshot store
/// and order gateway.
pub struct ClientSession {
    pub cart: CartStore,
    pub favorites: FavoritesStore,
    pub checkout: CheckoutAssembler,
    pub payments: PaymentSubmitter,
    pub orders: OrdersClient,
}

impl ClientSession {
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let store = Arc::new(JsonFileStore::new(config.data_dir.clone()));
        let gateway = Arc::new(HttpOrderGateway::new(config)?);
        Ok(Self::from_parts(store, gateway, RegularSchedule::default()))
    }

    pub fn from_parts(
        store: Arc<dyn SnapshotStore>,
        gateway: Arc<dyn OrderGateway>,
        regular_schedule: RegularSchedule,
    ) -> Self {
        Self {
            cart: CartStore::load(store.clone()),
            favorites: FavoritesStore::load(store),
            checkout: CheckoutAssembler::new(regular_schedule),
            payments: PaymentSubmitter::new(gateway.clone()),
            orders: OrdersClient::new(gateway),
        }
    }
}
