#![allow(dead_code)]

use std::sync::Arc;

use stock_clock::db::{DocumentStore, MemoryDocumentStore};
use stock_clock::proto::clock_in::CreateClockInReq;
use stock_clock::proto::items::CreateItemReq;
use stock_clock::services::{ClockInServiceImpl, ItemsServiceImpl};

pub fn memory_store() -> Arc<dyn DocumentStore> {
    Arc::new(MemoryDocumentStore::new())
}

pub fn items_service() -> ItemsServiceImpl {
    ItemsServiceImpl::new(memory_store())
}

pub fn clock_in_service() -> ClockInServiceImpl {
    ClockInServiceImpl::new(memory_store())
}

pub fn create_item_req(email: &str, item_name: &str, quantity: i64, expiry_date: &str) -> CreateItemReq {
    CreateItemReq {
        email: email.to_string(),
        item_name: item_name.to_string(),
        quantity,
        expiry_date: expiry_date.to_string(),
        insert_date: None,
    }
}

pub fn create_clock_in_req(email: &str, location: &str) -> CreateClockInReq {
    CreateClockInReq {
        email: email.to_string(),
        location: location.to_string(),
        insert_datetime: None,
    }
}

/// Identifier that is well-formed but was never issued.
pub const UNKNOWN_ID: &str = "0123456789abcdef0123456789abcdef";
