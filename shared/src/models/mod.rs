//! Domain models shared between the server and clients

pub mod address;
pub mod order;
pub mod payment;
pub mod product;
pub mod tenant;

pub use address::Address;
pub use order::{Order, OrderItem, OrderStatus, PaymentStatus, ShippingStatus};
pub use payment::{Payment, PaymentState};
pub use product::{
    InventoryStatus, Product, ProductCreate, ProductUpdate, ProductVariant, VariantCreate,
};
pub use tenant::TenantStatus;
