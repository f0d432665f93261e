use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CreateOrderRequest, OrderCustomer, OrderDto, OrderItemDto, OrderList, OrderProduct,
        UpdateOrderStatusRequest,
    },
    entity::{
        cart_items::Column as CartItemCol,
        customers::Column as CustomerCol,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
        CartItems, Carts, Customers, OrderItems, Orders, Products,
    },
    error::{AppError, AppResult},
    events::OrderCreated,
    middleware::auth::AuthUser,
    models::{is_valid_order_status, Order, ORDER_STATUS_UNPAID},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    routes::policy::{require_order_access, OrderRepr, OrderScope, OrderVerb},
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let access = require_order_access(user, OrderVerb::List)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    match access.scope {
        OrderScope::All => {}
        OrderScope::Own => {
            // Without a customer profile the caller cannot own any orders.
            let customer = Customers::find()
                .filter(CustomerCol::UserId.eq(user.user_id))
                .one(&state.orm)
                .await?;
            let Some(customer) = customer else {
                return Ok(ApiResponse::paginated(
                    "Ok",
                    OrderList { items: Vec::new() },
                    page,
                    limit,
                    0,
                ));
            };
            condition = condition.add(OrderCol::CustomerId.eq(customer.id));
        }
    }

    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = load_order_dtos(&state.orm, orders, access.repr).await?;
    Ok(ApiResponse::paginated("Ok", OrderList { items }, page, limit, total))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDto>> {
    let access = require_order_access(user, OrderVerb::Retrieve)?;

    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if access.scope == OrderScope::Own {
        ensure_owner(state, user, &order).await?;
    }

    let mut dtos = load_order_dtos(&state.orm, vec![order], access.repr).await?;
    let dto = dtos.pop().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("order dto construction returned nothing"))
    })?;
    Ok(ApiResponse::success("Ok", dto, None))
}

/// Convert a cart into an order. The whole conversion is one transaction:
/// either the order and all of its items exist and the cart is gone, or
/// nothing changed.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderDto>> {
    let access = require_order_access(user, OrderVerb::Create)?;

    let txn = state.orm.begin().await?;

    // The row lock keeps a concurrent conversion of the same cart from
    // passing the existence check before we delete it.
    let cart = Carts::find_by_id(payload.cart_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    if cart.is_none() {
        return Err(AppError::BadRequest(
            "There is no cart with this cart id".into(),
        ));
    }

    let cart_rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(payload.cart_id))
        .find_also_related(Products)
        .all(&txn)
        .await?;
    if cart_rows.is_empty() {
        return Err(AppError::BadRequest(
            "Your cart is empty, please add some products".into(),
        ));
    }

    // The profile must already exist; order creation never creates one.
    let customer = Customers::find()
        .filter(CustomerCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?;
    let customer = match customer {
        Some(c) => c,
        None => {
            return Err(AppError::BadRequest(
                "no customer profile exists for this account".into(),
            ));
        }
    };

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer.id),
        status: Set(ORDER_STATUS_UNPAID.to_string()),
        zarinpal_authority: Set(None),
        zarinpal_ref_id: Set(None),
        zarinpal_data: Set(None),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut total_price = 0;
    let mut order_items = Vec::with_capacity(cart_rows.len());
    for (cart_item, product) in &cart_rows {
        let product = product.as_ref().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("cart item {} has no product", cart_item.id))
        })?;
        total_price += product.unit_price * cart_item.quantity as i64;
        order_items.push(OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            quantity: Set(cart_item.quantity),
            // Snapshot: later product price changes do not touch this order.
            unit_price: Set(product.unit_price),
            created_at: NotSet,
        });
    }
    OrderItems::insert_many(order_items).exec(&txn).await?;

    // Cart items cascade with the cart.
    Carts::delete_by_id(payload.cart_id).exec(&txn).await?;

    txn.commit().await?;

    state.events.publish(OrderCreated {
        order_id: order.id,
        customer_id: customer.id,
        total_price,
    });

    let mut dtos = load_order_dtos(&state.orm, vec![order], access.repr).await?;
    let dto = dtos.pop().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("order dto construction returned nothing"))
    })?;
    Ok(ApiResponse::success("Order created", dto, Some(Meta::empty())))
}

pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    require_order_access(user, OrderVerb::UpdateStatus)?;

    if !is_valid_order_status(&payload.status) {
        return Err(AppError::BadRequest(format!(
            "invalid order status '{}'",
            payload.status
        )));
    }

    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = order.into();
    active.status = Set(payload.status);
    let order = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Status updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Orders with items attached cannot be deleted; the items hold the
/// snapshot the paid record depends on.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    require_order_access(user, OrderVerb::Delete)?;

    let order = Orders::find_by_id(id).one(&state.orm).await?;
    if order.is_none() {
        return Err(AppError::NotFound);
    }

    let attached = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(id))
        .count(&state.orm)
        .await?;
    if attached > 0 {
        return Err(AppError::Conflict(
            "there are order items attached to this order".into(),
        ));
    }

    Orders::delete_by_id(id).exec(&state.orm).await?;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Recompute the total from the snapshotted lines. Used by the payment
/// flow for both initiation and verification amounts.
pub async fn order_total<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<i64> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(conn)
        .await?;
    Ok(items
        .iter()
        .map(|item| item.unit_price * item.quantity as i64)
        .sum())
}

/// Resolve ownership of an order for non-staff callers. Unmatched orders
/// surface as 404, not 403, so ids stay unguessable.
pub async fn ensure_owner(
    state: &AppState,
    user: &AuthUser,
    order: &OrderModel,
) -> AppResult<()> {
    let customer = Customers::find()
        .filter(CustomerCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    match customer {
        Some(c) if c.id == order.customer_id => Ok(()),
        _ => Err(AppError::NotFound),
    }
}

async fn load_order_dtos<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
    repr: OrderRepr,
) -> AppResult<Vec<OrderDto>> {
    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

    let item_rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .find_also_related(Products)
        .all(conn)
        .await?;

    let mut items_by_order: HashMap<Uuid, Vec<OrderItemDto>> = HashMap::new();
    for (item, product) in item_rows {
        let product = product.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("order item {} has no product", item.id))
        })?;
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderItemDto {
                id: item.id,
                product: OrderProduct {
                    id: product.id,
                    name: product.name,
                    unit_price: product.unit_price,
                },
                quantity: item.quantity,
                unit_price: item.unit_price,
            });
    }

    let customers_by_id: HashMap<Uuid, OrderCustomer> = match repr {
        OrderRepr::Customer => HashMap::new(),
        OrderRepr::Admin => {
            let customer_ids: Vec<Uuid> = orders.iter().map(|o| o.customer_id).collect();
            Customers::find()
                .filter(CustomerCol::Id.is_in(customer_ids))
                .all(conn)
                .await?
                .into_iter()
                .map(|c| {
                    (
                        c.id,
                        OrderCustomer {
                            id: c.id,
                            user_id: c.user_id,
                            phone_number: c.phone_number,
                        },
                    )
                })
                .collect()
        }
    };

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            let total_price = items
                .iter()
                .map(|i| i.unit_price * i.quantity as i64)
                .sum();
            let customer = match repr {
                OrderRepr::Customer => None,
                OrderRepr::Admin => customers_by_id.get(&order.customer_id).map(|c| OrderCustomer {
                    id: c.id,
                    user_id: c.user_id,
                    phone_number: c.phone_number.clone(),
                }),
            };
            OrderDto {
                id: order.id,
                status: order.status,
                created_at: order.created_at.with_timezone(&Utc),
                items,
                total_price,
                customer,
            }
        })
        .collect())
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        customer_id: model.customer_id,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
