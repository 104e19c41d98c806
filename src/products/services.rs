use tracing::info;

use super::{
    dto::ProductRequest,
    repo::ProductStore,
    repo_types::{Product, ProductFields},
};
use crate::{
    error::AppError,
    validator::{char_len, Validator},
};

pub fn validate_product(v: &mut Validator, input: &ProductRequest) {
    v.check(!input.name.is_empty(), "name", "must be provided");
    v.check(char_len(&input.name) >= 5, "name", "must be at least 5 characters long");
    v.check(char_len(&input.name) <= 100, "name", "must not be more than 100 characters long");
    v.check(input.price > 0, "price", "must be provided and greater than 0");
    v.check(input.stock_available > 0, "stock_available", "must be provided and greater than 0");
    v.check(!input.image_url.is_empty(), "image_url", "image url must be provided");
}

fn checked_fields(input: ProductRequest) -> Result<ProductFields, AppError> {
    let mut v = Validator::new();
    validate_product(&mut v, &input);
    v.into_result()?;

    Ok(ProductFields {
        name: input.name,
        description: input.description,
        price: input.price,
        stock_available: input.stock_available,
        image_url: input.image_url,
    })
}

pub async fn create_product(
    products: &dyn ProductStore,
    input: ProductRequest,
) -> Result<Product, AppError> {
    let fields = checked_fields(input)?;
    let product = products.insert(&fields).await?;
    info!(product_id = product.id, "product created");
    Ok(product)
}

pub async fn get_product(products: &dyn ProductStore, id: i64) -> Result<Product, AppError> {
    Ok(products.get(id).await?)
}

pub async fn update_product(
    products: &dyn ProductStore,
    id: i64,
    input: ProductRequest,
) -> Result<Product, AppError> {
    let fields = checked_fields(input)?;
    let product = products.update(id, &fields).await?;
    info!(product_id = product.id, "product updated");
    Ok(product)
}
