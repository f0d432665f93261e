use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddCartItemRequest, CartDetail, CartItemDto, CartProduct, UpdateCartItemRequest},
        customers::{CreateCustomerRequest, CustomerList, UpdateCustomerRequest},
        orders::{
            CreateOrderRequest, OrderCustomer, OrderDto, OrderItemDto, OrderList, OrderProduct,
            PayOrderResponse, UpdateOrderStatusRequest, VerifyResponse,
        },
        products::{
            AddProductImageRequest, BannerList, CreateBannerRequest, CreateProductRequest,
            ProductDetail, ProductList, UpdateProductRequest,
        },
    },
    models::{BannerImage, Customer, Order, OrderItem, Product, ProductImage},
    response::{ApiResponse, ErrorBody, Meta},
    routes::{banners, carts, customers, health, health::HealthData, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::add_product_image,
        products::remove_product_image,
        banners::list_banners,
        banners::create_banner,
        banners::delete_banner,
        carts::create_cart,
        carts::get_cart,
        carts::delete_cart,
        carts::add_item,
        carts::update_item,
        carts::remove_item,
        customers::list_customers,
        customers::create_customer,
        customers::get_me,
        customers::update_me,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_status,
        orders::delete_order,
        orders::pay_order,
        orders::verify_payment
    ),
    components(
        schemas(
            Product,
            ProductImage,
            BannerImage,
            Customer,
            Order,
            OrderItem,
            ProductList,
            ProductDetail,
            BannerList,
            CreateProductRequest,
            UpdateProductRequest,
            AddProductImageRequest,
            CreateBannerRequest,
            AddCartItemRequest,
            UpdateCartItemRequest,
            CreateCustomerRequest,
            UpdateCustomerRequest,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            CartDetail,
            CartItemDto,
            CartProduct,
            CustomerList,
            OrderList,
            OrderDto,
            OrderItemDto,
            OrderProduct,
            OrderCustomer,
            PayOrderResponse,
            VerifyResponse,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ErrorBody,
            HealthData,
            ApiResponse<HealthData>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<ProductDetail>,
            ApiResponse<ProductImage>,
            ApiResponse<BannerList>,
            ApiResponse<BannerImage>,
            ApiResponse<CartDetail>,
            ApiResponse<CartItemDto>,
            ApiResponse<Customer>,
            ApiResponse<CustomerList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<OrderDto>,
            ApiResponse<PayOrderResponse>,
            ApiResponse<VerifyResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Banners", description = "Banner image endpoints"),
        (name = "Carts", description = "Anonymous cart endpoints"),
        (name = "Customers", description = "Customer profile endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Payments", description = "Payment gateway endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
