use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, Statement};
use uuid::Uuid;

use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::{
        cart::AddCartItemRequest,
        orders::{CreateOrderRequest, UpdateOrderStatusRequest},
    },
    entity::{
        cart_items::Column as CartItemCol,
        customers::ActiveModel as CustomerActive,
        products::ActiveModel as ProductActive,
        CartItems, Carts, Orders,
    },
    error::AppError,
    events::EventBus,
    gateway::ZarinpalClient,
    middleware::auth::AuthUser,
    routes::params::OrderListQuery,
    services::{cart_service, order_service, payment_service, product_service},
    state::AppState,
};

// Full cart-to-order lifecycle: merge on repeated add, transactional
// conversion, snapshot pricing, role-scoped listing, deletion conflicts,
// and the already-paid short circuit.
#[tokio::test]
async fn cart_to_order_lifecycle() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    // Seed a customer profile and a product.
    let owner = AuthUser {
        user_id: Uuid::new_v4(),
        staff: false,
    };
    let staff = AuthUser {
        user_id: Uuid::new_v4(),
        staff: true,
    };
    let stranger = AuthUser {
        user_id: Uuid::new_v4(),
        staff: false,
    };

    let customer = CustomerActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner.user_id),
        phone_number: Set("09120000000".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Walnut Chess Board".into()),
        slug: Set("walnut-chess-board".into()),
        description: Set(Some("Hand finished".into())),
        unit_price: Set(100),
        inventory: Set(25),
        cover: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    // Build a cart and add the same product twice: one row, summed quantity.
    let cart = cart_service::create_cart(&state).await?.data.unwrap();
    for _ in 0..2 {
        cart_service::add_item(
            &state,
            cart.id,
            AddCartItemRequest {
                product_id: product.id,
                quantity: 1,
            },
        )
        .await?;
    }
    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .all(&state.orm)
        .await?;
    assert_eq!(lines.len(), 1, "repeated add must merge into one row");
    assert_eq!(lines[0].quantity, 2);

    // Creating an order from a missing or empty cart fails and leaves no row.
    let before = Orders::find().all(&state.orm).await?.len();
    let err = order_service::create_order(
        &state,
        &owner,
        CreateOrderRequest {
            cart_id: Uuid::new_v4(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let empty_cart = cart_service::create_cart(&state).await?.data.unwrap();
    let err = order_service::create_order(
        &state,
        &owner,
        CreateOrderRequest {
            cart_id: empty_cart.id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(Orders::find().all(&state.orm).await?.len(), before);

    // Successful conversion: order holds the snapshot, the cart is gone.
    let order = order_service::create_order(
        &state,
        &owner,
        CreateOrderRequest { cart_id: cart.id },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(order.status, "unpaid");
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].unit_price, 100);
    assert_eq!(order.total_price, 200);
    assert!(Carts::find_by_id(cart.id).one(&state.orm).await?.is_none());

    // Snapshot pricing: a later product price change must not move the total.
    let mut active: ProductActive = product.clone().into();
    active.unit_price = Set(999);
    active.update(&state.orm).await?;
    let reread = order_service::get_order(&state, &owner, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(reread.total_price, 200);
    assert_eq!(reread.items[0].unit_price, 100);

    // Role scoping: the owner sees the order, a stranger sees nothing,
    // staff see everything with the customer block attached.
    let query = || OrderListQuery {
        page: None,
        per_page: None,
        status: None,
        sort_order: None,
    };
    let own = order_service::list_orders(&state, &owner, query())
        .await?
        .data
        .unwrap();
    assert_eq!(own.items.len(), 1);
    assert!(own.items[0].customer.is_none());

    let other = order_service::list_orders(&state, &stranger, query())
        .await?
        .data
        .unwrap();
    assert!(other.items.is_empty());

    let all = order_service::list_orders(&state, &staff, query())
        .await?
        .data
        .unwrap();
    assert_eq!(all.items.len(), 1);
    let block = all.items[0].customer.as_ref().expect("admin repr");
    assert_eq!(block.id, customer.id);

    // Stranger retrieving by id gets a 404, never a peek.
    let err = order_service::get_order(&state, &stranger, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Referenced rows cannot be deleted.
    let err = product_service::delete_product(&state, &staff, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let err = order_service::delete_order(&state, &staff, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Payment initiation is owner-scoped for every role: staff without a
    // matching customer profile get the same 404 as any stranger, and the
    // order keeps no authority from the attempt.
    let err = payment_service::pay(&state, &staff, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    let untouched = Orders::find_by_id(order.id)
        .one(&state.orm)
        .await?
        .expect("order row");
    assert!(untouched.zarinpal_authority.is_none());

    // Staff-only verbs are rejected for regular users by the policy table.
    let err = order_service::update_status(
        &state,
        &owner,
        order.id,
        UpdateOrderStatusRequest {
            status: "canceled".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Mark the order paid and check the pay short circuit: no gateway call
    // is made, the refusal comes straight from the status check.
    let updated = order_service::update_status(
        &state,
        &staff,
        order.id,
        UpdateOrderStatusRequest {
            status: "paid".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.status, "paid");

    let err = payment_service::pay(&state, &owner, order.id)
        .await
        .unwrap_err();
    match err {
        AppError::BadRequest(message) => assert!(message.contains("already been paid")),
        other => panic!("expected already-paid refusal, got {other:?}"),
    }

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs.
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, cart_items, carts, customers, product_images, banner_images, products CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        zarinpal_merchant_id: "test-merchant".into(),
        // Unroutable on purpose: nothing in this flow may reach the gateway.
        zarinpal_base_url: "http://127.0.0.1:9".into(),
        callback_base_url: "http://127.0.0.1:3000".into(),
    };
    let gateway = ZarinpalClient::new(
        config.zarinpal_merchant_id.clone(),
        config.zarinpal_base_url.clone(),
    );

    Ok(AppState {
        orm,
        config,
        gateway,
        events: EventBus::new(8),
    })
}
