use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde_dynamo::aws_sdk_dynamodb_1::from_item;

use crate::error::DatabaseError;
use irrigation_backend::shared::domain::ProductKey;

/// Get a provisioned product key record
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

/// Claim a product key for a new machine registration
///
/// Flips `is_registered` false -> true under a condition expression so the
/// flip itself is the registration mutex: two concurrent registrations with
/// the same key cannot both succeed.
///
/// # Returns
/// * `Ok(true)` - Key claimed
/// * `Ok(false)` - Key already registered (conditional check failed)
/// * `Err(DatabaseError)` - Other DynamoDB error occurred
pub async fn claim_product_key(
    client: &DynamoDbClient,
    table_name: &str,
    product_key: &str,
) -> Result<bool, DatabaseError> {
    set_registered(client, table_name, product_key, true, false).await
}

/// Release a product key when its machine is deleted (`is_registered` -> false)
///
/// Returns Ok(false) if the key was already unregistered; deletion treats
/// that as success since the goal state is reached either way.
pub async fn release_product_key(
    client: &DynamoDbClient,
    table_name: &str,
    product_key: &str,
) -> Result<bool, DatabaseError> {
    set_registered(client, table_name, product_key, false, true).await
}

async fn set_registered(
    client: &DynamoDbClient,
    table_name: &str,
    product_key: &str,
    registered: bool,
    expected_current: bool,
) -> Result<bool, DatabaseError> {
    let result = client
        .update_item()
        .table_name(table_name)
        .key("product_key", AttributeValue::S(product_key.to_string()))
        .update_expression("SET is_registered = :new")
        .condition_expression("attribute_exists(product_key) AND is_registered = :expected")
        .expression_attribute_values(":new", AttributeValue::Bool(registered))
        .expression_attribute_values(":expected", AttributeValue::Bool(expected_current))
        .send()
        .await;

    match result {
        Ok(_) => Ok(true),
        Err(err) if is_conditional_check_failed(&err) => Ok(false),
        Err(err) => Err(DatabaseError::DynamoDb(format!("{:?}", err))),
    }
}

fn is_conditional_check_failed(err: &SdkError<UpdateItemError>) -> bool {
    match err {
        SdkError::ServiceError(service_err) => {
            matches!(
                service_err.err(),
                UpdateItemError::ConditionalCheckFailedException(_)
            )
        }
        _ => false,
    }
}
