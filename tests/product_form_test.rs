use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use catalog_admin::errors::ServiceError;
use catalog_admin::models::{Product, ProductForm};
use catalog_admin::notifications::{Notice, NoticeKind, NoticeSender};
use catalog_admin::pricing::{InventoryFields, PriceEdit, PricingFields, QuantityEdit, Violation};
use catalog_admin::services::{ProductApi, ProductFormService, ProductPayload};
use mockall::mock;
use rust_decimal_macros::dec;
use serde_json::Map;
use tokio::sync::mpsc::Receiver;

mock! {
    pub Api {}

    #[async_trait]
    impl ProductApi for Api {
        async fn create(&self, payload: ProductPayload) -> Result<Product, ServiceError>;
        async fn update(&self, id: &str, payload: ProductPayload) -> Result<Product, ServiceError>;
    }
}

fn saved_product(id: &str, name: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        sku: "SKU-1".to_string(),
        description: None,
        category_id: None,
        is_active: true,
        attributes: Map::new(),
        pricing: PricingFields::default(),
        inventory: InventoryFields::default(),
    }
}

fn service(api: MockApi) -> (ProductFormService<MockApi>, Receiver<Notice>) {
    let (notices, receiver) = NoticeSender::channel(16);
    (ProductFormService::new(Arc::new(api), notices), receiver)
}

fn valid_form() -> ProductForm {
    let mut form = ProductForm::new();
    form.name = "Standing Desk".to_string();
    form.sku = "SKU-1".to_string();
    form
}

#[tokio::test]
async fn submit_creates_when_form_has_no_id() {
    let mut api = MockApi::new();
    api.expect_create()
        .withf(|payload| payload.name == "Standing Desk" && payload.sku == "SKU-1")
        .times(1)
        .returning(|payload| Ok(saved_product("p1", &payload.name)));

    let (service, _receiver) = service(api);
    let product = service.submit(&valid_form()).await.expect("create succeeds");
    assert_eq!(product.id, "p1");
}

#[tokio::test]
async fn submit_updates_when_form_has_an_id() {
    let mut api = MockApi::new();
    api.expect_update()
        .withf(|id, _| id == "p1")
        .times(1)
        .returning(|id, payload| Ok(saved_product(id, &payload.name)));

    let (service, _receiver) = service(api);
    let mut form = valid_form();
    form.id = Some("p1".to_string());

    let product = service.submit(&form).await.expect("update succeeds");
    assert_eq!(product.id, "p1");
}

#[tokio::test]
async fn malformed_attribute_json_aborts_before_any_service_call() {
    let mut api = MockApi::new();
    api.expect_create().times(0);
    api.expect_update().times(0);

    let (service, mut receiver) = service(api);
    let mut form = valid_form();
    form.attributes_json = "{\"color\": ".to_string();

    let result = service.submit(&form).await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    let notice = receiver.try_recv().expect("one notice");
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.code, "invalid_product_form");
}

#[tokio::test]
async fn missing_name_fails_validation() {
    let mut api = MockApi::new();
    api.expect_create().times(0);

    let (service, _receiver) = service(api);
    let mut form = valid_form();
    form.name = "   ".to_string();

    let result = service.submit(&form).await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn service_failure_emits_notice_and_keeps_form() {
    let mut api = MockApi::new();
    api.expect_create()
        .times(1)
        .returning(|_| Err(ServiceError::ExternalServiceError("503".into())));

    let (service, mut receiver) = service(api);
    let form = valid_form();
    let before = form.clone();

    let result = service.submit(&form).await;
    assert_matches!(result, Err(ServiceError::ExternalServiceError(_)));
    assert_eq!(form, before);

    let notice = receiver.try_recv().expect("one notice");
    assert_eq!(notice.code, "product_service_error");
}

#[test]
fn payload_carries_parsed_attributes() {
    let mut form = valid_form();
    form.attributes_json = r#"{"color": "oak", "width_cm": 140}"#.to_string();

    let payload = ProductPayload::from_form(&form).expect("payload builds");
    assert_eq!(payload.attributes.len(), 2);
    assert_eq!(payload.attributes["color"], "oak");
}

#[test]
fn form_seeded_from_product_keeps_derived_fields() {
    let mut product = saved_product("p1", "Standing Desk");
    product.pricing = PricingFields {
        cost_price: dec!(100000),
        base_price: dec!(150000),
        current_price: dec!(135000),
        profit_percentage: dec!(50),
        discount_percentage: dec!(10),
    };
    product.inventory = InventoryFields::new(7, 3);

    let form = ProductForm::from_product(&product);
    assert_eq!(form.id.as_deref(), Some("p1"));
    assert_eq!(form.pricing.base_price, dec!(150000));
    assert_eq!(form.inventory.total_quantity(), 10);
}

#[test]
fn price_edits_write_back_into_the_form() {
    let mut form = valid_form();
    form.apply_price_edit(PriceEdit::Cost(dec!(100000)));

    // 10% markup gets clamped to the minimum, with a violation to show.
    let violations = form.apply_price_edit(PriceEdit::Base(dec!(110000)));
    assert_eq!(form.pricing.base_price, dec!(120000));
    assert_matches!(
        violations.as_slice(),
        [Violation::ProfitBelowMinimum { .. }]
    );

    form.apply_quantity_edit(QuantityEdit::Available(7));
    form.apply_quantity_edit(QuantityEdit::Reserved(3));
    assert_eq!(form.inventory.total_quantity(), 10);
}
