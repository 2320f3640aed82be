//! redb-based storage layer for the hall core
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `goods` | `goods_id` | `Good` | Goods catalog |
//! | `inventory` | `goods_id` | `InventoryRecord` | Stock and waiting counts |
//! | `sessions` | `session_id` | `PaymentSession` | Order/payment sessions |
//! | `tickets` | `unique_id` | `Ticket` | Issued tickets |
//! | `ticket_sequences` | `shop_id` | `TicketNumInfo` | 每店独立的票号序列 |
//! | `barcode_prefixes` | `shop_id` | `BarcodeInfo` | Barcode prefix registrations |
//! | `barcode_bindings` | `barcode` | `TicketBarcodeBind` | Resolved barcode cache |
//! | `auth_entries` | `uid` | `AuthEntry` | Role grants |
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate`: a commit is persistent as soon
//! as `commit()` returns, via copy-on-write with an atomic pointer swap, so
//! the file stays consistent across power loss.
//!
//! # Transactions
//!
//! redb has a single writer. The settlement path opens one write
//! transaction spanning sufficiency re-check, inventory reservation, ticket
//! minting, and the session state flip; dropping the transaction uncommits
//! everything. The `*_txn` methods operate inside a caller-owned
//! transaction and see its uncommitted writes.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::models::{
    AuthEntry, BarcodeInfo, Good, InventoryRecord, PaymentSession, Ticket, TicketBarcodeBind,
    TicketNumInfo,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

const GOODS_TABLE: JsonTable = TableDefinition::new("goods");
const INVENTORY_TABLE: JsonTable = TableDefinition::new("inventory");
const SESSIONS_TABLE: JsonTable = TableDefinition::new("sessions");
const TICKETS_TABLE: JsonTable = TableDefinition::new("tickets");
const TICKET_SEQ_TABLE: JsonTable = TableDefinition::new("ticket_sequences");
const BARCODE_PREFIX_TABLE: JsonTable = TableDefinition::new("barcode_prefixes");
const BARCODE_BIND_TABLE: JsonTable = TableDefinition::new("barcode_bindings");
const AUTH_TABLE: JsonTable = TableDefinition::new("auth_entries");

const ALL_TABLES: [JsonTable; 8] = [
    GOODS_TABLE,
    INVENTORY_TABLE,
    SESSIONS_TABLE,
    TICKETS_TABLE,
    TICKET_SEQ_TABLE,
    BARCODE_PREFIX_TABLE,
    BARCODE_BIND_TABLE,
    AUTH_TABLE,
];

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for shared::AppError {
    fn from(err: StorageError) -> Self {
        shared::AppError::database(err.to_string())
    }
}

/// Hall document store backed by redb
#[derive(Clone)]
pub struct HallStore {
    db: Arc<Database>,
}

impl HallStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, demos)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Create all tables up front so read transactions never race table
        // creation
        let write_txn = db.begin_write()?;
        {
            for table in ALL_TABLES {
                let _ = write_txn.open_table(table)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Generic JSON helpers ==========

    fn put_txn<T: serde::Serialize>(
        txn: &WriteTransaction,
        table: JsonTable,
        key: &str,
        value: &T,
    ) -> StorageResult<()> {
        let mut t = txn.open_table(table)?;
        let buf = serde_json::to_vec(value)?;
        t.insert(key, buf.as_slice())?;
        Ok(())
    }

    fn get_txn<T: serde::de::DeserializeOwned>(
        txn: &WriteTransaction,
        table: JsonTable,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let t = txn.open_table(table)?;
        match t.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn put<T: serde::Serialize>(&self, table: JsonTable, key: &str, value: &T) -> StorageResult<()> {
        let txn = self.begin_write()?;
        Self::put_txn(&txn, table, key, value)?;
        txn.commit()?;
        Ok(())
    }

    fn get<T: serde::de::DeserializeOwned>(
        &self,
        table: JsonTable,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;
        match t.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn list<T: serde::de::DeserializeOwned>(&self, table: JsonTable) -> StorageResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;

        let mut items = Vec::new();
        for result in t.iter()? {
            let (_key, value) = result?;
            items.push(serde_json::from_slice(value.value())?);
        }
        Ok(items)
    }

    // ========== Goods ==========

    pub fn put_goods(&self, good: &Good) -> StorageResult<()> {
        self.put(GOODS_TABLE, &good.goods_id, good)
    }

    pub fn get_goods(&self, goods_id: &str) -> StorageResult<Option<Good>> {
        self.get(GOODS_TABLE, goods_id)
    }

    pub fn get_goods_txn(
        &self,
        txn: &WriteTransaction,
        goods_id: &str,
    ) -> StorageResult<Option<Good>> {
        Self::get_txn(txn, GOODS_TABLE, goods_id)
    }

    // ========== Inventory ==========

    pub fn put_inventory(&self, record: &InventoryRecord) -> StorageResult<()> {
        self.put(INVENTORY_TABLE, &record.goods_id, record)
    }

    pub fn put_inventory_txn(
        &self,
        txn: &WriteTransaction,
        record: &InventoryRecord,
    ) -> StorageResult<()> {
        Self::put_txn(txn, INVENTORY_TABLE, &record.goods_id, record)
    }

    pub fn get_inventory(&self, goods_id: &str) -> StorageResult<Option<InventoryRecord>> {
        self.get(INVENTORY_TABLE, goods_id)
    }

    pub fn get_inventory_txn(
        &self,
        txn: &WriteTransaction,
        goods_id: &str,
    ) -> StorageResult<Option<InventoryRecord>> {
        Self::get_txn(txn, INVENTORY_TABLE, goods_id)
    }

    // ========== Sessions ==========

    pub fn put_session(&self, session: &PaymentSession) -> StorageResult<()> {
        self.put(SESSIONS_TABLE, &session.session_id, session)
    }

    pub fn put_session_txn(
        &self,
        txn: &WriteTransaction,
        session: &PaymentSession,
    ) -> StorageResult<()> {
        Self::put_txn(txn, SESSIONS_TABLE, &session.session_id, session)
    }

    pub fn get_session(&self, session_id: &str) -> StorageResult<Option<PaymentSession>> {
        self.get(SESSIONS_TABLE, session_id)
    }

    pub fn get_session_txn(
        &self,
        txn: &WriteTransaction,
        session_id: &str,
    ) -> StorageResult<Option<PaymentSession>> {
        Self::get_txn(txn, SESSIONS_TABLE, session_id)
    }

    pub fn session_exists(&self, session_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(SESSIONS_TABLE)?;
        Ok(t.get(session_id)?.is_some())
    }

    // ========== Tickets ==========

    pub fn put_ticket(&self, ticket: &Ticket) -> StorageResult<()> {
        self.put(TICKETS_TABLE, &ticket.unique_id, ticket)
    }

    pub fn put_ticket_txn(&self, txn: &WriteTransaction, ticket: &Ticket) -> StorageResult<()> {
        Self::put_txn(txn, TICKETS_TABLE, &ticket.unique_id, ticket)
    }

    pub fn get_ticket(&self, unique_id: &str) -> StorageResult<Option<Ticket>> {
        self.get(TICKETS_TABLE, unique_id)
    }

    pub fn get_ticket_txn(
        &self,
        txn: &WriteTransaction,
        unique_id: &str,
    ) -> StorageResult<Option<Ticket>> {
        Self::get_txn(txn, TICKETS_TABLE, unique_id)
    }

    pub fn list_tickets(&self) -> StorageResult<Vec<Ticket>> {
        self.list(TICKETS_TABLE)
    }

    // ========== Ticket sequences ==========

    pub fn put_sequence(&self, shop_id: &str, info: &TicketNumInfo) -> StorageResult<()> {
        self.put(TICKET_SEQ_TABLE, shop_id, info)
    }

    pub fn put_sequence_txn(
        &self,
        txn: &WriteTransaction,
        shop_id: &str,
        info: &TicketNumInfo,
    ) -> StorageResult<()> {
        Self::put_txn(txn, TICKET_SEQ_TABLE, shop_id, info)
    }

    pub fn get_sequence(&self, shop_id: &str) -> StorageResult<Option<TicketNumInfo>> {
        self.get(TICKET_SEQ_TABLE, shop_id)
    }

    pub fn get_sequence_txn(
        &self,
        txn: &WriteTransaction,
        shop_id: &str,
    ) -> StorageResult<Option<TicketNumInfo>> {
        Self::get_txn(txn, TICKET_SEQ_TABLE, shop_id)
    }

    // ========== Barcode prefixes and bindings ==========

    pub fn put_barcode_info(&self, info: &BarcodeInfo) -> StorageResult<()> {
        self.put(BARCODE_PREFIX_TABLE, &info.shop_id, info)
    }

    pub fn list_barcode_infos(&self) -> StorageResult<Vec<BarcodeInfo>> {
        self.list(BARCODE_PREFIX_TABLE)
    }

    pub fn put_binding(&self, bind: &TicketBarcodeBind) -> StorageResult<()> {
        self.put(BARCODE_BIND_TABLE, &bind.barcode, bind)
    }

    pub fn get_binding(&self, barcode: &str) -> StorageResult<Option<TicketBarcodeBind>> {
        self.get(BARCODE_BIND_TABLE, barcode)
    }

    // ========== Auth entries ==========

    pub fn put_auth_entry(&self, entry: &AuthEntry) -> StorageResult<()> {
        self.put(AUTH_TABLE, &entry.uid, entry)
    }

    pub fn get_auth_entry(&self, uid: &str) -> StorageResult<Option<AuthEntry>> {
        self.get(AUTH_TABLE, uid)
    }
}
