use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Order, OrderStatusType, OrderType};

/// Criteria for [`crate::OrderManagement::search_orders`]. All criteria are combined with AND. Archived orders are
/// excluded unless `include_archived` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub user_id: Option<i64>,
    /// Matches orders where the user is either the owner or the receiver.
    pub party_id: Option<i64>,
    pub order_types: Option<Vec<OrderType>>,
    pub statuses: Option<Vec<OrderStatusType>>,
    pub top_up_provider_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub include_archived: bool,
}

impl OrderQueryFilter {
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_party(mut self, user_id: i64) -> Self {
        self.party_id = Some(user_id);
        self
    }

    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_types.get_or_insert_with(Vec::new).push(order_type);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.statuses.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn with_top_up_provider(mut self, provider_id: i64) -> Self {
        self.top_up_provider_id = Some(provider_id);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn including_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() &&
            self.party_id.is_none() &&
            self.order_types.is_none() &&
            self.statuses.is_none() &&
            self.top_up_provider_id.is_none() &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters. ")?;
        }
        if let Some(user_id) = &self.user_id {
            write!(f, "user_id: {user_id}. ")?;
        }
        if let Some(party_id) = &self.party_id {
            write!(f, "party: {party_id}. ")?;
        }
        if let Some(types) = &self.order_types {
            let types = types.iter().map(|t| t.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "types: [{types}]. ")?;
        }
        if let Some(statuses) = &self.statuses {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        if let Some(provider) = &self.top_up_provider_id {
            write!(f, "provider: {provider}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if self.include_archived {
            write!(f, "including archived.")?;
        }
        Ok(())
    }
}

/// A page of orders together with the sum of their amounts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderResult {
    pub total: Money,
    pub orders: Vec<Order>,
}

impl From<Vec<Order>> for OrderResult {
    fn from(orders: Vec<Order>) -> Self {
        let total = orders.iter().map(|o| o.amount).sum();
        Self { total, orders }
    }
}
