//! Shareable messaging service.
//!
//! `MessagingService` owns the store behind a tokio `RwLock`, a delivery
//! transport, and a pump task that applies transport events. It is created
//! explicitly with [`MessagingService::create`] and torn down with
//! [`MessagingService::dispose`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::messaging::core::config::{MessagingConfig, TypingConfig};
use crate::messaging::core::errors::{MessagingError, MessagingResult};
use crate::messaging::core::ids::{ConversationId, MessageId};
use crate::messaging::core::kinds::ContentKind;
use crate::messaging::core::model::Message;
use crate::messaging::delivery::{DeliverySink, DeliveryTransport, SimulatedTransport};
use crate::messaging::fixtures;
use crate::messaging::store::{ConversationListItem, ConversationStore, StoreEvent, ThreadMessage};

/// Store instance shared between UI handlers and background tasks.
pub struct MessagingService {
    store: Arc<RwLock<ConversationStore>>,
    transport: Arc<dyn DeliveryTransport>,
    sink: DeliverySink,
    typing: TypingConfig,
    typing_timers: DashMap<ConversationId, JoinHandle<()>>,
    shutdown: Arc<Notify>,
    pump: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl MessagingService {
    /// Wrap `store` and start the event pump.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn create(
        store: ConversationStore,
        transport: Arc<dyn DeliveryTransport>,
        typing: TypingConfig,
    ) -> Self {
        let store = Arc::new(RwLock::new(store));
        let shutdown = Arc::new(Notify::new());
        let (tx, rx) = mpsc::unbounded_channel();

        let pump = tokio::spawn(run_pump(Arc::clone(&store), rx, Arc::clone(&shutdown)));
        info!("messaging service started");

        Self {
            store,
            transport,
            sink: DeliverySink::new(tx),
            typing,
            typing_timers: DashMap::new(),
            shutdown,
            pump: Mutex::new(Some(pump)),
            closed: AtomicBool::new(false),
        }
    }

    /// Wrap `store` with a [`SimulatedTransport`] using `config`'s delays.
    #[must_use]
    pub fn simulated(store: ConversationStore, config: &MessagingConfig) -> Self {
        let transport = Arc::new(SimulatedTransport::new(config.delivery.clone()));
        Self::create(store, transport, config.typing.clone())
    }

    /// Seed a store from fixtures and run it with simulated delivery.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or seeding fails.
    pub fn bootstrap(config: &MessagingConfig) -> MessagingResult<Self> {
        let store = fixtures::seed_store(config)?;
        Ok(Self::simulated(store, config))
    }

    /// Whether [`Self::dispose`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> MessagingResult<()> {
        if self.is_closed() {
            Err(MessagingError::ServiceClosed)
        } else {
            Ok(())
        }
    }

    /// Select a conversation and mark its incoming messages read.
    ///
    /// # Errors
    /// Returns `ServiceClosed` after disposal.
    pub async fn select_conversation(&self, id: &ConversationId) -> MessagingResult<bool> {
        self.ensure_open()?;
        Ok(self.store.write().await.select_conversation(id))
    }

    /// Send a message to the active conversation and hand it to the transport.
    ///
    /// # Errors
    /// Returns `ServiceClosed`, `NoActiveConversation`, or `EmptyContent`.
    pub async fn send_message(&self, content: &str, kind: ContentKind) -> MessagingResult<MessageId> {
        self.ensure_open()?;
        let id = self.store.write().await.send_message(content, kind)?;
        self.transport.dispatch(&id, &self.sink);
        Ok(id)
    }

    /// Mark messages read; unknown ids are skipped.
    ///
    /// # Errors
    /// Returns `ServiceClosed` after disposal.
    pub async fn mark_read(&self, ids: &[MessageId]) -> MessagingResult<usize> {
        self.ensure_open()?;
        Ok(self.store.write().await.mark_read(ids))
    }

    /// Delete a message and stop its pending acknowledgements.
    ///
    /// # Errors
    /// Returns `ServiceClosed` after disposal.
    pub async fn delete_message(&self, id: &MessageId) -> MessagingResult<Option<Message>> {
        self.ensure_open()?;
        let removed = self.store.write().await.delete_message(id);
        if removed.is_some() {
            self.transport.cancel(id);
        }
        Ok(removed)
    }

    /// Add a reaction from the current user.
    ///
    /// # Errors
    /// Returns `ServiceClosed` after disposal.
    pub async fn add_reaction(&self, id: &MessageId, emoji: &str) -> MessagingResult<bool> {
        self.ensure_open()?;
        Ok(self.store.write().await.add_reaction(id, emoji))
    }

    /// Set or clear the current user's typing marker on the active conversation.
    ///
    /// Each conversation's marker expires after the idle timeout unless
    /// refreshed; timers of other conversations are left alone.
    ///
    /// # Errors
    /// Returns `ServiceClosed` after disposal.
    pub async fn set_typing(&self, is_typing: bool) -> MessagingResult<()> {
        self.ensure_open()?;
        // Timers are armed under the write lock so the latest marker always
        // owns the latest timer.
        let mut store = self.store.write().await;
        let Some(conversation_id) = store.active_id().cloned() else {
            return Ok(());
        };
        let marker = store.set_typing(is_typing);

        if let Some((_, previous)) = self.typing_timers.remove(&conversation_id) {
            previous.abort();
        }

        if let Some(marker) = marker {
            let idle = self.typing.idle_timeout();
            let sink = self.sink.clone();
            let event = StoreEvent::TypingExpired {
                conversation_id: conversation_id.clone(),
                since: marker.timestamp,
            };
            let handle = tokio::spawn(async move {
                tokio::time::sleep(idle).await;
                sink.send(event);
            });
            self.typing_timers.insert(conversation_id.clone(), handle);
            debug!(%conversation_id, ?idle, "typing expiry armed");
        }
        drop(store);
        Ok(())
    }

    /// Store the conversation-list filter term.
    ///
    /// # Errors
    /// Returns `ServiceClosed` after disposal.
    pub async fn search_conversations(&self, term: &str) -> MessagingResult<()> {
        self.ensure_open()?;
        self.store.write().await.search_conversations(term);
        Ok(())
    }

    /// Conversation list filtered by the current search term.
    pub async fn conversation_list(&self) -> Vec<ConversationListItem> {
        self.store.read().await.conversation_list()
    }

    /// Messages of the active conversation.
    pub async fn active_thread(&self) -> Vec<ThreadMessage> {
        self.store.read().await.active_thread()
    }

    /// Run `f` against a read-locked snapshot of the store.
    pub async fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&ConversationStore) -> R + Send,
    {
        f(&*self.store.read().await)
    }

    /// Messages still waiting for a transport acknowledgement.
    #[must_use]
    pub fn pending_acknowledgements(&self) -> usize {
        self.transport.pending()
    }

    fn abort_typing_timers(&self) {
        self.typing_timers.retain(|_, handle| {
            handle.abort();
            false
        });
    }

    /// Stop the pump, cancel every pending timer, and reject further writes.
    ///
    /// Safe to call more than once.
    pub async fn dispose(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.shutdown.notify_one();
        let cancelled = self.transport.cancel_all();
        self.abort_typing_timers();

        if let Some(pump) = self.pump.lock().await.take() {
            if let Err(err) = pump.await {
                warn!(?err, "event pump ended abnormally");
            }
        }
        info!(cancelled, "messaging service disposed");
    }
}

impl Drop for MessagingService {
    fn drop(&mut self) {
        self.shutdown.notify_one();
        self.transport.cancel_all();
        self.abort_typing_timers();
    }
}

async fn run_pump(
    store: Arc<RwLock<ConversationStore>>,
    mut rx: UnboundedReceiver<StoreEvent>,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                let changed = store.write().await.apply(&event);
                debug!(?event, changed, "store event applied");
            }
            () = shutdown.notified() => {
                info!("event pump shutting down");
                break;
            }
        }
    }
}
