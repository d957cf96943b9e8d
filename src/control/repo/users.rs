use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

use crate::error::DatabaseError;
use irrigation_backend::shared::domain::User;

/// Name of the GSI that indexes users by email
pub const EMAIL_INDEX: &str = "gsi_email";

/// Name of the GSI that indexes users by session token hash
pub const SESSION_TOKEN_INDEX: &str = "gsi_session_token";

/// Get a user by user_id (partition key)
pub async fn get_user(
    client: &DynamoDbClient,
    table_name: &str,
    user_id: &str,
) -> Result<Option<User>, DatabaseError> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("user_id", AttributeValue::S(user_id.to_string()))
        .send()
        .await
        .map_err(|e| DatabaseError::DynamoDb(format!("{:?}", e)))?;

    match result.item {
        Some(item) => {
            let user: User =
                from_item(item).map_err(|e| DatabaseError::Serialization(e.to_string()))?;
            Ok(Some(user))
        }
        None => Ok(None),
    }
}

/// Get a user by email via the email GSI (used for signup uniqueness and login)
pub async fn get_user_by_email(
    client: &DynamoDbClient,
    table_name: &str,
    email: &str,
) -> Result<Option<User>, DatabaseError> {
    query_single(client, table_name, EMAIL_INDEX, "email", email).await
}

/// Get a user by session token hash via the token GSI (request authentication)
pub async fn get_user_by_token_hash(
    client: &DynamoDbClient,
    table_name: &str,
    token_hash: &str,
) -> Result<Option<User>, DatabaseError> {
    query_single(
        client,
        table_name,
        SESSION_TOKEN_INDEX,
        "session_token_hash",
        token_hash,
    )
    .await
}

/// Whole-document upsert of a user record
pub async fn put_user(
    client: &DynamoDbClient,
    table_name: &str,
    user: &User,
) -> Result<(), DatabaseError> {
    let item = to_item(user).map_err(|e| DatabaseError::Serialization(e.to_string()))?;

    client
        .put_item()
        .table_name(table_name)
        .set_item(Some(item))
        .send()
        .await
        .map_err(|e| DatabaseError::DynamoDb(format!("{:?}", e)))?;

    Ok(())
}

async fn query_single(
    client: &DynamoDbClient,
    table_name: &str,
    index_name: &str,
    key_attr: &str,
    key_value: &str,
) -> Result<Option<User>, DatabaseError> {
    let result = client
        .query()
        .table_name(table_name)
        .index_name(index_name)
        .key_condition_expression("#k = :v")
        .expression_attribute_names("#k", key_attr)
        .expression_attribute_values(":v", AttributeValue::S(key_value.to_string()))
        .limit(1)
        .send()
        .await
        .map_err(|e| DatabaseError::DynamoDb(format!("{:?}", e)))?;

    match result.items.unwrap_or_default().into_iter().next() {
        Some(item) => {
            let user: User =
                from_item(item).map_err(|e| DatabaseError::Serialization(e.to_string()))?;
            Ok(Some(user))
        }
        None => Ok(None),
    }
}
