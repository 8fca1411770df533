// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use anyhow::Result;

use depot_app::{DetailKind, DetailRecord, EntityKind, FormPayload, Role};
use depot_query::{
    DetailCache, EntityGateway, FetchTicket, GatewayError, PageCache, PageKey, PageResult,
    apply_invalidation,
};
use depot_tui::{AppRuntime, InternalEvent, MutationCall};

/// Runtime the TUI drives: any `EntityGateway` (the REST client, or the
/// seeded in-memory gateway in demo mode) plus the process-wide caches.
/// Network calls run on worker threads; the caches are only ever touched
/// from the event-loop thread.
pub struct GatewayRuntime {
    gateway: Arc<dyn EntityGateway>,
    pages: PageCache,
    details: DetailCache,
    role: Role,
}

impl GatewayRuntime {
    pub fn new(gateway: Arc<dyn EntityGateway>, role: Role) -> Self {
        Self {
            gateway,
            pages: PageCache::new(),
            details: DetailCache::new(),
            role,
        }
    }
}

impl AppRuntime for GatewayRuntime {
    fn role(&self) -> Role {
        self.role
    }

    fn cached_page(&self, key: &PageKey) -> Option<PageResult> {
        self.pages.get(key)
    }

    fn store_page(&mut self, key: PageKey, page: PageResult) {
        self.pages.set(key, page);
    }

    fn cached_detail(&self, kind: DetailKind, id: i64) -> Option<DetailRecord> {
        self.details.get(kind, id)
    }

    fn store_detail(&mut self, kind: DetailKind, id: i64, record: DetailRecord) {
        self.details.set(kind, id, record);
    }

    fn invalidate(&mut self, kind: EntityKind, target: Option<i64>) {
        apply_invalidation(&mut self.pages, &mut self.details, kind, target);
    }

    fn fetch_page(&mut self, key: &PageKey) -> Result<PageResult, GatewayError> {
        self.gateway.fetch_page(key)
    }

    fn fetch_detail(&mut self, kind: DetailKind, id: i64) -> Result<DetailRecord, GatewayError> {
        self.gateway.fetch_detail(kind, id)
    }

    fn submit_form(
        &mut self,
        payload: &FormPayload,
        target: Option<i64>,
    ) -> Result<String, GatewayError> {
        match target {
            Some(id) => self.gateway.update(id, payload),
            None => self.gateway.create(payload),
        }
    }

    fn delete_row(&mut self, kind: EntityKind, id: i64) -> Result<String, GatewayError> {
        self.gateway.delete(kind, id)
    }

    fn spawn_fetch_page(
        &mut self,
        ticket: FetchTicket,
        key: PageKey,
        tx: &Sender<InternalEvent>,
    ) -> Result<()> {
        let gateway = Arc::clone(&self.gateway);
        let tx = tx.clone();
        thread::spawn(move || {
            let result = gateway.fetch_page(&key);
            let _ = tx.send(InternalEvent::PageLoaded {
                ticket,
                key,
                result,
            });
        });
        Ok(())
    }

    fn spawn_fetch_detail(
        &mut self,
        request_id: u64,
        kind: DetailKind,
        id: i64,
        tx: &Sender<InternalEvent>,
    ) -> Result<()> {
        let gateway = Arc::clone(&self.gateway);
        let tx = tx.clone();
        thread::spawn(move || {
            let result = gateway.fetch_detail(kind, id);
            let _ = tx.send(InternalEvent::DetailLoaded {
                request_id,
                kind,
                id,
                result,
            });
        });
        Ok(())
    }

    fn spawn_mutation(
        &mut self,
        request_id: u64,
        call: MutationCall,
        tx: &Sender<InternalEvent>,
    ) -> Result<()> {
        let gateway = Arc::clone(&self.gateway);
        let tx = tx.clone();
        thread::spawn(move || {
            let (kind, target) = call.describes();
            let result = match &call {
                MutationCall::Submit { payload, target } => match target {
                    Some(id) => gateway.update(*id, payload),
                    None => gateway.create(payload),
                },
                MutationCall::Delete { kind, id } => gateway.delete(*kind, *id),
            };
            let _ = tx.send(InternalEvent::MutationDone {
                request_id,
                kind,
                target,
                result,
            });
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::GatewayRuntime;
    use depot_app::{EntityKind, PageQuery, Role};
    use depot_query::PageKey;
    use depot_testkit::MemoryGateway;
    use depot_tui::{AppRuntime, InternalEvent};
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::time::Duration;

    fn runtime() -> GatewayRuntime {
        GatewayRuntime::new(Arc::new(MemoryGateway::seeded()), Role::Admin)
    }

    #[test]
    fn pages_round_trip_through_the_cache() {
        let mut runtime = runtime();
        let key = PageKey::new(EntityKind::Cargos, PageQuery::default(), None);
        assert!(runtime.cached_page(&key).is_none());

        let page = runtime.fetch_page(&key).expect("fetch page");
        runtime.store_page(key.clone(), page.clone());
        assert_eq!(runtime.cached_page(&key), Some(page));

        runtime.invalidate(EntityKind::Cargos, None);
        assert!(runtime.cached_page(&key).is_none());
    }

    #[test]
    fn threaded_fetch_posts_its_completion_event() {
        let mut runtime = runtime();
        let (tx, rx) = mpsc::channel();
        let key = PageKey::new(EntityKind::Trips, PageQuery::default(), None);
        let ticket = depot_query::FetchBoard::new().issue(EntityKind::Trips);

        runtime
            .spawn_fetch_page(ticket, key.clone(), &tx)
            .expect("spawn fetch");
        let event = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("completion should arrive");
        match event {
            InternalEvent::PageLoaded {
                ticket: got_ticket,
                key: got_key,
                result,
            } => {
                assert_eq!(got_ticket, ticket);
                assert_eq!(got_key, key);
                assert_eq!(result.expect("page").total_elements, 23);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn mutations_run_to_completion_even_if_nobody_listens() {
        let mut runtime = runtime();
        let (tx, rx) = mpsc::channel();
        runtime
            .spawn_mutation(
                1,
                depot_tui::MutationCall::Delete {
                    kind: EntityKind::Notifications,
                    id: 2,
                },
                &tx,
            )
            .expect("spawn mutation");
        // The receiver goes away; the worker must still finish server-side.
        drop(rx);
        std::thread::sleep(Duration::from_millis(100));

        let key = PageKey::new(EntityKind::Notifications, PageQuery::new(0, 25), None);
        let page = runtime.fetch_page(&key).expect("refetch");
        assert!(!page.rows.row_ids().contains(&2));
    }
}
