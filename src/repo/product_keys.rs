use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde_dynamo::aws_sdk_dynamodb_1::from_item;

use crate::error::DatabaseError;
use irrigation_backend::shared::domain::ProductKey;

/// Get a provisioned product key record by its key string
///
/// # Returns
/// * `Ok(Some(ProductKey))` - Record found
/// * `Ok(None)` - Key not provisioned
/// * `Err(DatabaseError)` - DynamoDB error occurred
pub async fn get_product_key(
    client: &DynamoDbClient,
    table_name: &str,
    product_key: &str,
) -> Result<Option<ProductKey>, DatabaseError> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("product_key", AttributeValue::S(product_key.to_string()))
        .send()
        .await
        .map_err(|e| DatabaseError::DynamoDb(format!("{:?}", e)))?;

    match result.item {
        Some(item) => {
            let record: ProductKey =
                from_item(item).map_err(|e| DatabaseError::Serialization(e.to_string()))?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}
