use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    MoneyAddedEvent,
    MoneyWithdrawnEvent,
    OrderCancelledEvent,
    OrderCreatedEvent,
    OrderStatusChangedEvent,
    TransactionCancelledEvent,
    WithdrawalApprovedEvent,
    WithdrawalDeniedEvent,
    WithdrawalRequestedEvent,
};

/// Generates the hook registry ([`EventHooks`]), the running handlers ([`EventHandlers`]) and the producer handles
/// ([`EventProducers`]) for every observational event kind.
macro_rules! event_hooks {
    ($($hook:ident, $producer:ident, $publish:ident: $event:ty;)+) => {
        #[derive(Default, Clone)]
        pub struct EventProducers {
            $(pub $producer: Vec<EventProducer<$event>>,)+
        }

        impl EventProducers {
            $(
            pub async fn $publish(&self, event: $event) {
                for emitter in &self.$producer {
                    emitter.publish_event(event.clone()).await;
                }
            }
            )+
        }

        pub struct EventHandlers {
            $(pub $hook: Option<EventHandler<$event>>,)+
        }

        impl EventHandlers {
            pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
                Self { $($hook: hooks.$hook.map(|f| EventHandler::new(buffer_size, f)),)+ }
            }

            pub fn producers(&self) -> EventProducers {
                let mut result = EventProducers::default();
                $(
                if let Some(handler) = &self.$hook {
                    result.$producer.push(handler.subscribe());
                }
                )+
                result
            }

            /// Spawns a task per registered hook. Each task ends once every producer for it has been dropped.
            pub async fn start_handlers(self) {
                $(
                if let Some(handler) = self.$hook {
                    tokio::spawn(async move {
                        handler.start_handler().await;
                    });
                }
                )+
            }
        }

        #[derive(Default, Clone)]
        pub struct EventHooks {
            $(pub $hook: Option<Handler<$event>>,)+
        }

        impl EventHooks {
            $(
            pub fn $hook<F>(&mut self, f: F) -> &mut Self
            where F: (Fn($event) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
                self.$hook = Some(Arc::new(f));
                self
            }
            )+
        }
    };
}

event_hooks! {
    on_order_created, order_created_producer, publish_order_created: OrderCreatedEvent;
    on_order_status_changed, order_status_changed_producer, publish_order_status_changed: OrderStatusChangedEvent;
    on_order_cancelled, order_cancelled_producer, publish_order_cancelled: OrderCancelledEvent;
    on_money_added, money_added_producer, publish_money_added: MoneyAddedEvent;
    on_money_withdrawn, money_withdrawn_producer, publish_money_withdrawn: MoneyWithdrawnEvent;
    on_transaction_cancelled, transaction_cancelled_producer, publish_transaction_cancelled: TransactionCancelledEvent;
    on_withdrawal_requested, withdrawal_requested_producer, publish_withdrawal_requested: WithdrawalRequestedEvent;
    on_withdrawal_approved, withdrawal_approved_producer, publish_withdrawal_approved: WithdrawalApprovedEvent;
    on_withdrawal_denied, withdrawal_denied_producer, publish_withdrawal_denied: WithdrawalDeniedEvent;
}
