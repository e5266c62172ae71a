//! In-memory collaborators
//!
//! Useful for tests, demos and single-station deployments where inventory,
//! manifests and packaging rules are loaded up front. Every check-and-set runs
//! under one mutex, so concurrent sessions observe atomic lock and claim.

use super::types::{
    CartLock, CartRecord, ContainerClaim, ContainerRecord, ContainerStatus, PackagingRule,
};
use super::{InventoryService, ManifestService, PackagingRules};
use crate::config::PackingConfig;
use crate::state_machine::LineItem;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct CartEntry {
    location: String,
    lock: Option<CartLockEntry>,
}

#[derive(Debug, Clone, Copy)]
struct CartLockEntry {
    session_id: Uuid,
    acquired_at: Instant,
}

#[derive(Debug, Clone)]
struct ContainerEntry {
    cart_barcode: String,
    status: ContainerStatus,
}

#[derive(Debug, Default)]
struct InventoryState {
    carts: HashMap<String, CartEntry>,
    containers: HashMap<String, ContainerEntry>,
}

/// In-memory inventory with optional cart lock expiry
///
/// Without a TTL a cart lock lasts until it is released. With a TTL, a lock
/// older than the TTL may be taken over by another session at its next
/// `lock_cart` call; nothing is unlocked in the background. A takeover also
/// reopens every container on the cart still claimed by the stale session.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    state: Mutex<InventoryState>,
    lock_ttl: Option<Duration>,
}

impl InMemoryInventory {
    /// Create an empty inventory whose cart locks never expire
    pub fn new() -> Self {
        Self::default()
    }

    /// Let cart locks older than `ttl` be taken over by other sessions
    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = Some(ttl);
        self
    }

    /// Create an empty inventory using the configured cart lock TTL
    pub fn from_config(config: &PackingConfig) -> Self {
        match config.cart_lock_ttl() {
            Some(ttl) => Self::new().with_lock_ttl(ttl),
            None => Self::new(),
        }
    }

    /// Add a cart parked at `location`
    pub fn with_cart(self, cart_barcode: impl Into<String>, location: impl Into<String>) -> Self {
        self.state.lock().carts.insert(
            cart_barcode.into(),
            CartEntry {
                location: location.into(),
                lock: None,
            },
        );
        self
    }

    /// Add an open container manifested on `cart_barcode`
    pub fn with_container(
        self,
        container_barcode: impl Into<String>,
        cart_barcode: impl Into<String>,
    ) -> Self {
        self.state.lock().containers.insert(
            container_barcode.into(),
            ContainerEntry {
                cart_barcode: cart_barcode.into(),
                status: ContainerStatus::Open,
            },
        );
        self
    }

    /// Move a cart to another location; returns false for unknown carts
    pub fn move_cart(&self, cart_barcode: &str, location: impl Into<String>) -> bool {
        match self.state.lock().carts.get_mut(cart_barcode) {
            Some(cart) => {
                cart.location = location.into();
                true
            }
            None => false,
        }
    }

    /// Session currently holding a cart, if any
    pub fn cart_lock_holder(&self, cart_barcode: &str) -> Option<Uuid> {
        self.state
            .lock()
            .carts
            .get(cart_barcode)
            .and_then(|cart| cart.lock)
            .map(|lock| lock.session_id)
    }

    /// Current status of a container, if known
    pub fn container_status(&self, container_barcode: &str) -> Option<ContainerStatus> {
        self.state
            .lock()
            .containers
            .get(container_barcode)
            .map(|c| c.status)
    }

    fn lock_expired(&self, lock: &CartLockEntry) -> bool {
        self.lock_ttl
            .map(|ttl| lock.acquired_at.elapsed() >= ttl)
            .unwrap_or(false)
    }
}

impl InventoryState {
    /// Reopen the containers on a cart that `session_id` still holds a claim on
    fn reopen_claims(&mut self, cart_barcode: &str, session_id: Uuid) -> usize {
        let mut reopened = 0;
        for container in self.containers.values_mut() {
            if container.cart_barcode == cart_barcode
                && container.status == ContainerStatus::Claimed(session_id)
            {
                container.status = ContainerStatus::Open;
                reopened += 1;
            }
        }
        reopened
    }
}

#[async_trait]
impl InventoryService for InMemoryInventory {
    async fn find_cart(&self, cart_barcode: &str) -> Option<CartRecord> {
        self.state
            .lock()
            .carts
            .get(cart_barcode)
            .map(|cart| CartRecord {
                cart_barcode: cart_barcode.to_string(),
                location: cart.location.clone(),
            })
    }

    async fn lock_cart(&self, cart_barcode: &str, session_id: Uuid) -> CartLock {
        let mut state = self.state.lock();
        let Some(cart) = state.carts.get_mut(cart_barcode) else {
            return CartLock::Unknown;
        };

        let stale = match cart.lock {
            Some(lock) if lock.session_id != session_id => {
                if !self.lock_expired(&lock) {
                    return CartLock::HeldBy(lock.session_id);
                }
                Some(lock.session_id)
            }
            _ => None,
        };

        cart.lock = Some(CartLockEntry {
            session_id,
            acquired_at: Instant::now(),
        });

        if let Some(stale) = stale {
            let reopened = state.reopen_claims(cart_barcode, stale);
            tracing::info!(
                cart = cart_barcode,
                stale_session = %stale,
                session_id = %session_id,
                reopened_containers = reopened,
                "expired cart lock taken over"
            );
        }
        CartLock::Acquired
    }

    async fn release_cart(&self, cart_barcode: &str, session_id: Uuid) -> bool {
        let mut state = self.state.lock();
        match state.carts.get_mut(cart_barcode) {
            Some(cart) if cart.lock.map(|l| l.session_id) == Some(session_id) => {
                cart.lock = None;
            }
            _ => return false,
        }
        state.reopen_claims(cart_barcode, session_id);
        true
    }

    async fn find_container(&self, container_barcode: &str) -> Option<ContainerRecord> {
        self.state
            .lock()
            .containers
            .get(container_barcode)
            .map(|c| ContainerRecord {
                container_barcode: container_barcode.to_string(),
                cart_barcode: c.cart_barcode.clone(),
                status: c.status,
            })
    }

    async fn claim_container(&self, container_barcode: &str, session_id: Uuid) -> ContainerClaim {
        let mut state = self.state.lock();
        let Some(container) = state.containers.get_mut(container_barcode) else {
            return ContainerClaim::Unknown;
        };

        match container.status {
            ContainerStatus::Open => {
                container.status = ContainerStatus::Claimed(session_id);
                ContainerClaim::Claimed
            }
            ContainerStatus::Claimed(holder) if holder == session_id => ContainerClaim::Claimed,
            ContainerStatus::Claimed(holder) => ContainerClaim::AlreadyClaimed(holder),
            ContainerStatus::Packed => ContainerClaim::AlreadyPacked,
        }
    }

    async fn release_container(&self, container_barcode: &str, session_id: Uuid) -> bool {
        let mut state = self.state.lock();
        match state.containers.get_mut(container_barcode) {
            Some(container) if container.status == ContainerStatus::Claimed(session_id) => {
                container.status = ContainerStatus::Open;
                true
            }
            _ => false,
        }
    }

    async fn mark_container_packed(&self, container_barcode: &str, session_id: Uuid) -> bool {
        let mut state = self.state.lock();
        match state.containers.get_mut(container_barcode) {
            Some(container) if container.status == ContainerStatus::Claimed(session_id) => {
                container.status = ContainerStatus::Packed;
                true
            }
            _ => false,
        }
    }
}

/// Manifests keyed by order id
#[derive(Debug, Default)]
pub struct StaticManifests {
    manifests: HashMap<String, Vec<LineItem>>,
    lookups: AtomicUsize,
}

impl StaticManifests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the expected lines of an order
    pub fn with_order(mut self, order_id: impl Into<String>, items: Vec<LineItem>) -> Self {
        self.manifests.insert(order_id.into(), items);
        self
    }

    /// Number of manifest lookups served
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl ManifestService for StaticManifests {
    fn expected_items(&self, order_id: &str) -> Option<Vec<LineItem>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.manifests.get(order_id).cloned()
    }
}

/// Packaging rules keyed by order id, with per-code stock counts
#[derive(Debug, Default)]
pub struct StaticPackagingRules {
    rules: HashMap<String, PackagingRule>,
    stock: Mutex<HashMap<String, u32>>,
    lookups: AtomicUsize,
}

impl StaticPackagingRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the packaging codes an order may use
    pub fn with_rule(mut self, order_id: impl Into<String>, allowed_codes: &[&str]) -> Self {
        let order_id = order_id.into();
        let codes = allowed_codes.iter().map(|c| c.to_string()).collect();
        self.rules
            .insert(order_id.clone(), PackagingRule::new(order_id, codes));
        self
    }

    /// Set the stock count of a packaging material
    pub fn with_stock(self, packaging_code: impl Into<String>, count: u32) -> Self {
        self.set_stock(packaging_code, count);
        self
    }

    pub fn set_stock(&self, packaging_code: impl Into<String>, count: u32) {
        self.stock.lock().insert(packaging_code.into(), count);
    }

    /// Number of rule lookups served
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl PackagingRules for StaticPackagingRules {
    fn packaging_rule(&self, order_id: &str) -> Option<PackagingRule> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.rules.get(order_id).cloned()
    }

    fn in_stock(&self, packaging_code: &str) -> bool {
        self.stock
            .lock()
            .get(packaging_code)
            .map(|count| *count > 0)
            .unwrap_or(false)
    }
}
