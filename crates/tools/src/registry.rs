//! The support toolbox: one executor for the whole tool catalogue.

use crate::call::SupportToolCall;
use crate::store::{InventoryStore, MockInventory, MockOrderStore, OrderStore};
use crate::{catalog, escalation, inventory, knowledge_search, orders};
use async_trait::async_trait;
use std::sync::Arc;
use supportdesk_core::{EventBus, ToolDefinition, ToolError, ToolExecutor, ToolOutput, ToolRequest};
use supportdesk_knowledge::VectorIndex;
use tracing::debug;

/// Executes [`SupportToolCall`]s against a shared knowledge index and
/// read-only order and inventory stores.
///
/// Cheap to clone; every field is behind an `Arc`.
#[derive(Clone)]
pub struct SupportToolbox {
    index: Arc<VectorIndex>,
    orders: Arc<dyn OrderStore>,
    inventory: Arc<dyn InventoryStore>,
    events: Option<Arc<EventBus>>,
}

impl SupportToolbox {
    pub fn new(
        index: Arc<VectorIndex>,
        orders: Arc<dyn OrderStore>,
        inventory: Arc<dyn InventoryStore>,
    ) -> Self {
        Self {
            index,
            orders,
            inventory,
            events: None,
        }
    }

    /// A toolbox over the sample order and inventory data.
    pub fn with_sample_data(index: Arc<VectorIndex>) -> Self {
        Self::new(
            index,
            Arc::new(MockOrderStore::sample()),
            Arc::new(MockInventory::sample()),
        )
    }

    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Run an already-decoded call.
    pub async fn dispatch(&self, call: &SupportToolCall) -> Result<String, ToolError> {
        match call {
            SupportToolCall::SearchKnowledgeBase(args) => {
                knowledge_search::search_knowledge_base(&self.index, args).await
            }
            SupportToolCall::GetOrderStatus(args) => orders::order_status(self.orders.as_ref(), args).await,
            SupportToolCall::ListOrders(args) => orders::list_orders(self.orders.as_ref(), args).await,
            SupportToolCall::InitiateReturn(args) => orders::initiate_return(self.orders.as_ref(), args).await,
            SupportToolCall::CheckProductAvailability(args) => {
                inventory::check_availability(self.inventory.as_ref(), args).await
            }
            SupportToolCall::EscalateToHuman(args) => {
                Ok(escalation::escalate(args, self.events.as_deref()))
            }
            SupportToolCall::SendGreeting => Ok(catalog::GREETING.to_string()),
            SupportToolCall::ListAvailableFunctions => Ok(catalog::capability_listing()),
        }
    }
}

impl std::fmt::Debug for SupportToolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupportToolbox")
            .field("index", &self.index)
            .field("events", &self.events.is_some())
            .finish()
    }
}

#[async_trait]
impl ToolExecutor for SupportToolbox {
    fn definitions(&self) -> Vec<ToolDefinition> {
        catalog::definitions()
    }

    async fn execute(&self, request: &ToolRequest) -> Result<ToolOutput, ToolError> {
        let call = SupportToolCall::try_from(request)?;
        debug!(tool = %call.name(), request_id = %request.id, "Executing tool");
        let text = self.dispatch(&call).await?;
        Ok(ToolOutput {
            request_id: request.id.clone(),
            tool_name: call.name().to_string(),
            text,
        })
    }

    fn contains(&self, name: &str) -> bool {
        name.parse::<crate::call::ToolName>().is_ok()
    }
}
