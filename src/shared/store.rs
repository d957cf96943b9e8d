use thiserror::Error;

use crate::domain::Machine;

/// Errors surfaced by a machine store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persistence contract for machine documents
///
/// One document per machine, whole-document reads and upserts. Per-document
/// write serialization is the storage layer's concern; the core takes no
/// locks and offers no isolation across concurrent writers to the same
/// machine.
#[allow(async_fn_in_trait)]
pub trait MachineStore {
    async fn load_machine(&self, machine_id: &str) -> Result<Option<Machine>, StoreError>;

    async fn load_machine_by_product_key(
        &self,
        product_key: &str,
    ) -> Result<Option<Machine>, StoreError>;

    /// Whole-document upsert
    async fn save_machine(&self, machine: &Machine) -> Result<(), StoreError>;
}

/// Load-mutate-save as an explicit update closure, keeping the
/// single-writer reload-then-save pattern in one place.
///
/// Returns Ok(None) when the machine does not exist. A save failure means
/// the caller must not assume the mutation took effect.
pub async fn with_machine<S, F, T>(
    store: &S,
    machine_id: &str,
    f: F,
) -> Result<Option<T>, StoreError>
where
    S: MachineStore,
    F: FnOnce(&mut Machine) -> T,
{
    let Some(mut machine) = store.load_machine(machine_id).await? else {
        return Ok(None);
    };
    let out = f(&mut machine);
    store.save_machine(&machine).await?;
    Ok(Some(out))
}

/// `with_machine`, addressed by product key (the device-facing identity)
pub async fn with_machine_by_product_key<S, F, T>(
    store: &S,
    product_key: &str,
    f: F,
) -> Result<Option<T>, StoreError>
where
    S: MachineStore,
    F: FnOnce(&mut Machine) -> T,
{
    let Some(mut machine) = store.load_machine_by_product_key(product_key).await? else {
        return Ok(None);
    };
    let out = f(&mut machine);
    store.save_machine(&machine).await?;
    Ok(Some(out))
}

/// DynamoDB-backed store used by both API planes
pub mod dynamo {
    use aws_sdk_dynamodb::types::AttributeValue;
    use aws_sdk_dynamodb::Client as DynamoDbClient;
    use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

    use super::{MachineStore, StoreError};
    use crate::domain::Machine;

    /// Name of the GSI that indexes machines by product key
    pub const PRODUCT_KEY_INDEX: &str = "gsi_product_key";

    /// One item per machine keyed by `machine_id`; device-facing lookups go
    /// through the product-key GSI. Reads and writes are always the whole
    /// document, matching the store contract.
    #[derive(Debug, Clone, Copy)]
    pub struct DynamoMachineStore<'a> {
        client: &'a DynamoDbClient,
        table_name: &'a str,
    }

    impl<'a> DynamoMachineStore<'a> {
        pub fn new(client: &'a DynamoDbClient, table_name: &'a str) -> Self {
            Self { client, table_name }
        }

        /// Delete a machine document (used when a machine is deregistered)
        pub async fn delete_machine(&self, machine_id: &str) -> Result<(), StoreError> {
            self.client
                .delete_item()
                .table_name(self.table_name)
                .key("machine_id", AttributeValue::S(machine_id.to_string()))
                .send()
                .await
                .map_err(|e| StoreError::Storage(format!("{:?}", e)))?;
            Ok(())
        }
    }

    impl MachineStore for DynamoMachineStore<'_> {
        async fn load_machine(&self, machine_id: &str) -> Result<Option<Machine>, StoreError> {
            let result = self
                .client
                .get_item()
                .table_name(self.table_name)
                .key("machine_id", AttributeValue::S(machine_id.to_string()))
                .send()
                .await
                .map_err(|e| StoreError::Storage(format!("{:?}", e)))?;

            match result.item {
                Some(item) => {
                    let machine: Machine =
                        from_item(item).map_err(|e| StoreError::Serialization(e.to_string()))?;
                    Ok(Some(machine))
                }
                None => Ok(None),
            }
        }

        async fn load_machine_by_product_key(
            &self,
            product_key: &str,
        ) -> Result<Option<Machine>, StoreError> {
            let result = self
                .client
                .query()
                .table_name(self.table_name)
                .index_name(PRODUCT_KEY_INDEX)
                .key_condition_expression("product_key = :pk")
                .expression_attribute_values(":pk", AttributeValue::S(product_key.to_string()))
                .limit(1)
                .send()
                .await
                .map_err(|e| StoreError::Storage(format!("{:?}", e)))?;

            match result.items.unwrap_or_default().into_iter().next() {
                Some(item) => {
                    let machine: Machine =
                        from_item(item).map_err(|e| StoreError::Serialization(e.to_string()))?;
                    Ok(Some(machine))
                }
                None => Ok(None),
            }
        }

        async fn save_machine(&self, machine: &Machine) -> Result<(), StoreError> {
            let item = to_item(machine).map_err(|e| StoreError::Serialization(e.to_string()))?;

            self.client
                .put_item()
                .table_name(self.table_name)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| StoreError::Storage(format!("{:?}", e)))?;

            Ok(())
        }
    }

}

/// In-memory store for deterministic tests
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::{MachineStore, StoreError};
    use crate::domain::Machine;

    /// HashMap-backed `MachineStore`; documents are cloned on load the way
    /// a real store deserializes a fresh copy per read
    #[derive(Debug, Default)]
    pub struct InMemoryMachineStore {
        machines: Mutex<HashMap<String, Machine>>,
    }

    impl InMemoryMachineStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, machine: Machine) {
            self.machines
                .lock()
                .unwrap()
                .insert(machine.machine_id.clone(), machine);
        }

        pub fn remove(&self, machine_id: &str) -> Option<Machine> {
            self.machines.lock().unwrap().remove(machine_id)
        }

        pub fn contains(&self, machine_id: &str) -> bool {
            self.machines.lock().unwrap().contains_key(machine_id)
        }

        pub fn len(&self) -> usize {
            self.machines.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    impl MachineStore for InMemoryMachineStore {
        async fn load_machine(&self, machine_id: &str) -> Result<Option<Machine>, StoreError> {
            Ok(self.machines.lock().unwrap().get(machine_id).cloned())
        }

        async fn load_machine_by_product_key(
            &self,
            product_key: &str,
        ) -> Result<Option<Machine>, StoreError> {
            Ok(self
                .machines
                .lock()
                .unwrap()
                .values()
                .find(|m| m.product_key == product_key)
                .cloned())
        }

        async fn save_machine(&self, machine: &Machine) -> Result<(), StoreError> {
            self.machines
                .lock()
                .unwrap()
                .insert(machine.machine_id.clone(), machine.clone());
            Ok(())
        }
    }
}
