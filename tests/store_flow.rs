use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use uuid::Uuid;

use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::{
        cart::{AddCartItemRequest, UpdateCartItemRequest},
        customers::{CreateCustomerRequest, UpdateCustomerRequest},
        orders::VerifyQuery,
        products::{CreateProductRequest, UpdateProductRequest},
    },
    entity::{
        customers::ActiveModel as CustomerActive,
        order_items::ActiveModel as OrderItemActive,
        orders::ActiveModel as OrderActive,
        products::ActiveModel as ProductActive,
        CartItems,
    },
    error::AppError,
    events::EventBus,
    gateway::ZarinpalClient,
    middleware::auth::AuthUser,
    routes::params::{Pagination, ProductQuery},
    services::{cart_service, customer_service, payment_service, product_service},
    state::AppState,
};

// Both tests in this binary share one database; serialize them so the
// truncate in the catalog flow cannot wipe rows seeded by the other.
static DB_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

#[tokio::test]
async fn catalog_cart_and_customer_flow() -> anyhow::Result<()> {
    let _guard = DB_LOCK.lock().await;
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

    // Unroutable gateway address: nothing in this flow may reach it.
    let state = setup_state(&database_url, true, "http://127.0.0.1:9").await?;

    let staff = AuthUser {
        user_id: Uuid::new_v4(),
        staff: true,
    };
    let shopper = AuthUser {
        user_id: Uuid::new_v4(),
        staff: false,
    };

    // Catalog: staff-only creation, slug derivation, name validation.
    let err = product_service::create_product(
        &state,
        &shopper,
        CreateProductRequest {
            name: "Ceramic Mug Set".into(),
            description: None,
            unit_price: 500,
            inventory: 10,
            cover: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = product_service::create_product(
        &state,
        &staff,
        CreateProductRequest {
            name: "Mug".into(),
            description: None,
            unit_price: 500,
            inventory: 10,
            cover: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let product = product_service::create_product(
        &state,
        &staff,
        CreateProductRequest {
            name: "Ceramic Mug Set".into(),
            description: Some("Set of four".into()),
            unit_price: 500,
            inventory: 10,
            cover: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(product.slug, "ceramic-mug-set");

    // Renaming refreshes the slug.
    let renamed = product_service::update_product(
        &state,
        &staff,
        product.id,
        UpdateProductRequest {
            name: Some("Stoneware Mug Set".into()),
            description: None,
            unit_price: None,
            inventory: None,
            cover: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(renamed.slug, "stoneware-mug-set");

    // Search finds it by name fragment.
    let found = product_service::list_products(
        &state,
        ProductQuery {
            page: None,
            per_page: None,
            q: Some("stoneware".into()),
            min_price: None,
            max_price: None,
            in_stock: Some(true),
            sort_by: None,
            sort_order: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(found.items.len(), 1);

    // Cart lifecycle: add, merge, set, remove, totals.
    let cart = cart_service::create_cart(&state).await?.data.unwrap();

    let err = cart_service::add_item(
        &state,
        cart.id,
        AddCartItemRequest {
            product_id: Uuid::new_v4(),
            quantity: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let line = cart_service::add_item(
        &state,
        cart.id,
        AddCartItemRequest {
            product_id: product.id,
            quantity: 2,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(line.item_total, 1000);

    let line = cart_service::add_item(
        &state,
        cart.id,
        AddCartItemRequest {
            product_id: product.id,
            quantity: 3,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(line.quantity, 5, "second add merges quantities");

    let line = cart_service::update_item(
        &state,
        cart.id,
        line.id,
        UpdateCartItemRequest { quantity: 2 },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(line.quantity, 2, "update assigns, never merges");

    let detail = cart_service::get_cart(&state, cart.id).await?.data.unwrap();
    assert_eq!(detail.total_price, 1000);

    cart_service::remove_item(&state, cart.id, line.id).await?;
    let detail = cart_service::get_cart(&state, cart.id).await?.data.unwrap();
    assert!(detail.items.is_empty());
    assert_eq!(detail.total_price, 0);

    // Deleting the cart cascades to its items.
    cart_service::add_item(
        &state,
        cart.id,
        AddCartItemRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;
    cart_service::delete_cart(&state, cart.id).await?;
    assert!(CartItems::find().all(&state.orm).await?.is_empty());

    // Customer profiles: no implicit creation, one per account.
    let err = customer_service::get_me(&state, &shopper).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    customer_service::create_customer(
        &state,
        &staff,
        CreateCustomerRequest {
            user_id: shopper.user_id,
            phone_number: "09121112233".into(),
        },
    )
    .await?;
    let err = customer_service::create_customer(
        &state,
        &staff,
        CreateCustomerRequest {
            user_id: shopper.user_id,
            phone_number: "09121112233".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let me = customer_service::update_me(
        &state,
        &shopper,
        UpdateCustomerRequest {
            phone_number: "09124445566".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(me.phone_number, "09124445566");

    let err = customer_service::list_customers(
        &state,
        &shopper,
        Pagination {
            page: None,
            per_page: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}

// Verification callback paths that never reach the gateway: unknown
// authority and a canceled redirect both fail before any outbound call.
#[tokio::test]
async fn verify_callback_rejects_before_contacting_gateway() -> anyhow::Result<()> {
    let _guard = DB_LOCK.lock().await;
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: no database configured.");
            return Ok(());
        }
    };

    let state = setup_state(&database_url, false, "http://127.0.0.1:9").await?;

    let err = payment_service::verify(
        &state,
        VerifyQuery {
            authority: "A-unknown".into(),
            status: "OK".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Seed an order carrying an authority, then deliver a NOK callback.
    let customer = CustomerActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Uuid::new_v4()),
        phone_number: Set("09120000001".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer.id),
        status: Set("unpaid".into()),
        zarinpal_authority: Set(Some("A-canceled".into())),
        zarinpal_ref_id: Set(None),
        zarinpal_data: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let err = payment_service::verify(
        &state,
        VerifyQuery {
            authority: "A-canceled".into(),
            status: "NOK".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // The order is untouched by the canceled callback.
    let reread = storefront_api::entity::Orders::find_by_id(order.id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(reread.status, "unpaid");
    assert!(reread.zarinpal_ref_id.is_none());

    Ok(())
}

// Success side of the verification callback against a local stand-in for
// the gateway: first callback settles the order, a replayed callback gets
// the already-verified code and changes nothing.
#[tokio::test]
async fn verify_settles_order_and_replay_is_idempotent() -> anyhow::Result<()> {
    let _guard = DB_LOCK.lock().await;
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: no database configured.");
            return Ok(());
        }
    };

    // Stand-in gateway: code 100 on the first verify call, 101 after.
    let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let stub_calls = calls.clone();
    let stub = axum::Router::new().route(
        "/pg/v4/payment/verify.json",
        axum::routing::post(move || {
            let calls = stub_calls.clone();
            async move {
                let n = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                let code = if n == 0 { 100 } else { 101 };
                axum::Json(serde_json::json!({ "status_code": code, "ref_id": 987001 }))
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let gateway_base = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move {
        axum::serve(listener, stub).await.ok();
    });

    let state = setup_state(&database_url, false, &gateway_base).await?;

    let customer = CustomerActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Uuid::new_v4()),
        phone_number: Set("09120000002".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Oak Serving Tray".into()),
        slug: Set("oak-serving-tray".into()),
        description: Set(None),
        unit_price: Set(450),
        inventory: Set(5),
        cover: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer.id),
        status: Set("unpaid".into()),
        zarinpal_authority: Set(Some("A-settle".into())),
        zarinpal_ref_id: Set(None),
        zarinpal_data: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    OrderItemActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        product_id: Set(product.id),
        quantity: Set(2),
        unit_price: Set(450),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let verified = payment_service::verify(
        &state,
        VerifyQuery {
            authority: "A-settle".into(),
            status: "OK".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(verified.order_id, order.id);
    assert_eq!(verified.status, "paid");
    assert_eq!(verified.ref_id.as_deref(), Some("987001"));

    let settled = storefront_api::entity::Orders::find_by_id(order.id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(settled.status, "paid");
    assert_eq!(settled.zarinpal_ref_id.as_deref(), Some("987001"));
    assert!(
        settled
            .zarinpal_data
            .as_deref()
            .is_some_and(|raw| raw.contains("100")),
        "raw gateway payload is kept on the order"
    );

    // Replayed callback: the gateway answers 101, the call still succeeds,
    // and the stored ref does not move.
    let replay = payment_service::verify(
        &state,
        VerifyQuery {
            authority: "A-settle".into(),
            status: "OK".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(replay.ref_id.as_deref(), Some("987001"));

    let after = storefront_api::entity::Orders::find_by_id(order.id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(after.status, "paid");
    assert_eq!(after.zarinpal_ref_id, settled.zarinpal_ref_id);
    assert_eq!(after.zarinpal_data, settled.zarinpal_data);
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);

    Ok(())
}

async fn setup_state(
    database_url: &str,
    truncate: bool,
    gateway_base_url: &str,
) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Only the catalog flow resets the tables; the verify test seeds its
    // own rows and may run concurrently with it.
    if truncate {
        let backend = orm.get_database_backend();
        orm.execute(Statement::from_string(
            backend,
            "TRUNCATE TABLE order_items, orders, cart_items, carts, customers, product_images, banner_images, products CASCADE",
        ))
        .await?;
    }

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        zarinpal_merchant_id: "test-merchant".into(),
        zarinpal_base_url: gateway_base_url.into(),
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
