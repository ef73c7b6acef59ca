use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderStatusType},
    order_machine::{OrderAction, TransitionPlan},
    wallet_api::{errors::WalletError, order_objects::OrderQueryFilter},
};

const ORDER_COLUMNS: &str = "id, title, amount, status, order_type, user_id, receiver_user_id, top_up_provider_id, \
                             provider_reference, description, payment_completion_date, created_at, updated_at, \
                             deleted_at";

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// Orders created directly in `Completed` have their completion date stamped on insert.
pub async fn insert_order(
    order: NewOrder,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, WalletError> {
    let sql = format!(
        r#"
        INSERT INTO orders (
            title,
            amount,
            status,
            order_type,
            user_id,
            receiver_user_id,
            top_up_provider_id,
            provider_reference,
            description,
            payment_completion_date
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, CASE WHEN $3 = 'completed' THEN CURRENT_TIMESTAMP END)
        RETURNING {ORDER_COLUMNS}"#
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(order.title)
        .bind(order.amount)
        .bind(status)
        .bind(order.order_type)
        .bind(order.user_id)
        .bind(order.receiver_user_id)
        .bind(order.top_up_provider_id)
        .bind(order.provider_reference)
        .bind(order.description)
        .fetch_one(conn)
        .await?;
    debug!("📦️ Order #{} ({}) of {} saved with status {}", order.id, order.order_type, order.amount, order.status);
    Ok(order)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, WalletError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `id` in ascending order
pub async fn fetch_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, WalletError> {
    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE "));
    let mut where_clause = builder.separated(" AND ");
    if query.include_archived {
        where_clause.push("1 = 1");
    } else {
        where_clause.push("deleted_at IS NULL");
    }
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(party_id) = query.party_id {
        where_clause.push("(user_id = ");
        where_clause.push_bind_unseparated(party_id);
        where_clause.push_unseparated(" OR receiver_user_id = ");
        where_clause.push_bind_unseparated(party_id);
        where_clause.push_unseparated(")");
    }
    if let Some(types) = query.order_types.filter(|t| !t.is_empty()) {
        where_clause.push("order_type IN (");
        let mut first = true;
        for t in types {
            if !first {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(t);
            first = false;
        }
        where_clause.push_unseparated(")");
    }
    if let Some(statuses) = query.statuses.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        let mut first = true;
        for s in statuses {
            if !first {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(s);
            first = false;
        }
        where_clause.push_unseparated(")");
    }
    if let Some(provider) = query.top_up_provider_id {
        where_clause.push("top_up_provider_id = ");
        where_clause.push_bind_unseparated(provider);
    }
    if let Some(since) = query.since {
        where_clause.push("datetime(created_at) >= datetime(");
        where_clause.push_bind_unseparated(since);
        where_clause.push_unseparated(")");
    }
    if let Some(until) = query.until {
        where_clause.push("datetime(created_at) <= datetime(");
        where_clause.push_bind_unseparated(until);
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY id ASC");
    trace!("📦️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📦️ Result of fetch_orders: {}", orders.len());
    Ok(orders)
}

/// Moves the order from `plan.from` to `plan.to`, provided it is still in `plan.from`. The completion date is only
/// ever set once.
///
/// Returns `InvalidOrderStatus` with the order's actual status if the guard fails.
pub async fn apply_status_change(plan: &TransitionPlan, conn: &mut SqliteConnection) -> Result<Order, WalletError> {
    let sql = format!(
        r#"
        UPDATE orders SET
            status = $1,
            description = COALESCE($2, description),
            payment_completion_date = CASE WHEN $3 THEN COALESCE(payment_completion_date, CURRENT_TIMESTAMP)
                ELSE payment_completion_date END,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $4 AND status = $5 AND deleted_at IS NULL
        RETURNING {ORDER_COLUMNS}"#
    );
    let updated = sqlx::query_as::<_, Order>(&sql)
        .bind(plan.to)
        .bind(plan.description.as_deref())
        .bind(plan.stamp_completion)
        .bind(plan.order_id)
        .bind(plan.from)
        .fetch_optional(&mut *conn)
        .await?;
    match updated {
        Some(order) => {
            debug!("📦️ Order #{} moved from {} to {}", order.id, plan.from, order.status);
            Ok(order)
        },
        None => {
            let current = fetch_order(plan.order_id, &mut *conn).await?.ok_or(WalletError::OrderNotFound(plan.order_id))?;
            warn!(
                "📦️ Order #{} was expected to be {} but is {}. The {} was not applied.",
                plan.order_id, plan.from, current.status, plan.action
            );
            Err(WalletError::InvalidOrderStatus { status: current.status, action: plan.action })
        },
    }
}

/// Soft-deletes a terminal order. Archiving an archived order returns it unchanged.
pub async fn archive_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Order, WalletError> {
    let sql = format!(
        "UPDATE orders SET deleted_at = COALESCE(deleted_at, CURRENT_TIMESTAMP), updated_at = CURRENT_TIMESTAMP WHERE \
         id = $1 AND status IN ('completed', 'cancelled', 'refunded') RETURNING {ORDER_COLUMNS}"
    );
    let archived = sqlx::query_as::<_, Order>(&sql).bind(order_id).fetch_optional(&mut *conn).await?;
    match archived {
        Some(order) => {
            info!("📦️ Order #{order_id} has been archived");
            Ok(order)
        },
        None => {
            let current = fetch_order(order_id, &mut *conn).await?.ok_or(WalletError::OrderNotFound(order_id))?;
            Err(WalletError::InvalidOrderStatus { status: current.status, action: OrderAction::Archive })
        },
    }
}
