use std::sync::Arc;

use super::{Constant, FieldType, Layout, RecordPage, Rid, Scan, UpdateScan};
use crate::common::{DbError, DbResult};
use crate::file::BlockId;
use crate::tx::Transaction;

/// Row-level access to a table file, one block at a time.
///
/// A table named `T` lives in file `T.tbl`; every block of that file is a
/// record page of the scan's layout. The scan keeps exactly one block pinned
/// at a time and walks slots within it before moving on.
pub struct TableScan<'tx> {
    tx: &'tx mut Transaction,
    layout: Arc<Layout>,
    rp: Option<RecordPage>,
    filename: String,
    current_slot: i32,
}

impl<'tx> TableScan<'tx> {
    pub fn new(tx: &'tx mut Transaction, tblname: &str, layout: Arc<Layout>) -> DbResult<Self> {
        let filename = format!("{}.tbl", tblname);
        let mut ts = TableScan {
            tx,
            layout,
            rp: None,
            filename,
            current_slot: -1,
        };
        if ts.tx.size(&ts.filename)? == 0 {
            ts.move_to_new_block()?;
        } else {
            ts.move_to_block(0)?;
        }
        Ok(ts)
    }

    fn move_to_block(&mut self, blknum: i64) -> DbResult<()> {
        self.close_current();
        let blk = BlockId::new(self.filename.clone(), blknum)?;
        self.rp = Some(RecordPage::new(self.tx, blk, self.layout.clone())?);
        self.current_slot = -1;
        Ok(())
    }

    fn move_to_new_block(&mut self) -> DbResult<()> {
        self.close_current();
        let blk = self.tx.append(&self.filename)?;
        let rp = RecordPage::new(self.tx, blk, self.layout.clone())?;
        rp.format(self.tx)?;
        self.rp = Some(rp);
        self.current_slot = -1;
        Ok(())
    }

    fn close_current(&mut self) {
        if let Some(rp) = self.rp.take() {
            self.tx.unpin(rp.block());
        }
    }

    fn current_block_number(&self) -> i64 {
        match &self.rp {
            Some(rp) => rp.block().number(),
            None => 0,
        }
    }

    fn at_last_block(&mut self) -> DbResult<bool> {
        let size = self.tx.size(&self.filename)?;
        Ok(self.current_block_number() == size - 1)
    }

    fn no_current_block() -> DbError {
        DbError::InvalidArgument("scan has no current block".to_string())
    }
}

impl Scan for TableScan<'_> {
    fn before_first(&mut self) -> DbResult<()> {
        self.move_to_block(0)
    }

    fn next(&mut self) -> DbResult<bool> {
        loop {
            let slot = match &self.rp {
                Some(rp) => rp.next_after(self.tx, self.current_slot)?,
                None => return Err(Self::no_current_block()),
            };
            if slot >= 0 {
                self.current_slot = slot;
                return Ok(true);
            }
            if self.at_last_block()? {
                return Ok(false);
            }
            let next = self.current_block_number() + 1;
            self.move_to_block(next)?;
        }
    }

    fn get_int(&mut self, fldname: &str) -> DbResult<i32> {
        match &self.rp {
            Some(rp) => rp.get_int(self.tx, self.current_slot, fldname),
            None => Err(Self::no_current_block()),
        }
    }

    fn get_string(&mut self, fldname: &str) -> DbResult<String> {
        match &self.rp {
            Some(rp) => rp.get_string(self.tx, self.current_slot, fldname),
            None => Err(Self::no_current_block()),
        }
    }

    fn get_val(&mut self, fldname: &str) -> DbResult<Constant> {
        match self.layout.schema().field_type(fldname) {
            Some(FieldType::Integer) => Ok(Constant::Int(self.get_int(fldname)?)),
            Some(FieldType::Varchar) => Ok(Constant::Str(self.get_string(fldname)?)),
            None => Err(DbError::InvalidArgument(format!(
                "no such field: {}",
                fldname
            ))),
        }
    }

    fn has_field(&self, fldname: &str) -> bool {
        self.layout.schema().has_field(fldname)
    }

    fn close(&mut self) {
        self.close_current();
    }
}

impl UpdateScan for TableScan<'_> {
    fn set_int(&mut self, fldname: &str, val: i32) -> DbResult<()> {
        match &self.rp {
            Some(rp) => rp.set_int(self.tx, self.current_slot, fldname, val),
            None => Err(Self::no_current_block()),
        }
    }

    fn set_string(&mut self, fldname: &str, val: &str) -> DbResult<()> {
        match &self.rp {
            Some(rp) => rp.set_string(self.tx, self.current_slot, fldname, val),
            None => Err(Self::no_current_block()),
        }
    }

    fn set_val(&mut self, fldname: &str, val: &Constant) -> DbResult<()> {
        match self.layout.schema().field_type(fldname) {
            Some(FieldType::Integer) => self.set_int(fldname, val.as_int()?),
            Some(FieldType::Varchar) => self.set_string(fldname, val.as_str()?),
            None => Err(DbError::InvalidArgument(format!(
                "no such field: {}",
                fldname
            ))),
        }
    }

    fn insert(&mut self) -> DbResult<()> {
        loop {
            let slot = match &self.rp {
                Some(rp) => rp.insert_after(self.tx, self.current_slot)?,
                None => return Err(Self::no_current_block()),
            };
            if slot >= 0 {
                self.current_slot = slot;
                return Ok(());
            }
            if self.at_last_block()? {
                self.move_to_new_block()?;
            } else {
                let next = self.current_block_number() + 1;
                self.move_to_block(next)?;
            }
        }
    }

    fn delete(&mut self) -> DbResult<()> {
        match &self.rp {
            Some(rp) => rp.delete(self.tx, self.current_slot),
            None => Err(Self::no_current_block()),
        }
    }

    fn get_rid(&self) -> Rid {
        Rid::new(self.current_block_number(), self.current_slot)
    }

    fn move_to_rid(&mut self, rid: Rid) -> DbResult<()> {
        self.close_current();
        let blk = BlockId::new(self.filename.clone(), rid.block_number())?;
        self.rp = Some(RecordPage::new(self.tx, blk, self.layout.clone())?);
        self.current_slot = rid.slot();
        Ok(())
    }
}

impl Drop for TableScan<'_> {
    fn drop(&mut self) {
        self.close_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Schema;
    use crate::utils;
    use crate::{Database, config::DbConfig};

    fn test_layout() -> Arc<Layout> {
        let mut sch = Schema::new();
        sch.add_int_field("a");
        sch.add_string_field("b", 9);
        Arc::new(Layout::new(sch))
    }

    fn open_db(annot: &str) -> Database {
        let cfg = DbConfig::default()
            .with_block_size(400)
            .with_lock_timeout_ms(500);
        Database::with_config(utils::test_dir(annot.to_string()), cfg).expect("database")
    }

    #[test]
    fn test_insert_spans_multiple_blocks() {
        let db = open_db("ts_span");
        let mut tx = db.new_tx().expect("tx");
        {
            let mut ts = TableScan::new(&mut tx, "t", test_layout()).expect("scan");
            for i in 0..50 {
                ts.insert().expect("insert");
                ts.set_int("a", i).expect("set a");
                ts.set_string("b", &format!("rec{}", i)).expect("set b");
            }
            ts.close();
        }
        // 8 slots per 400-byte block
        assert!(tx.size("t.tbl").unwrap() >= 7);

        {
            let mut ts = TableScan::new(&mut tx, "t", test_layout()).expect("scan");
            ts.before_first().expect("before first");
            let mut count = 0;
            while ts.next().expect("next") {
                let a = ts.get_int("a").expect("get a");
                assert_eq!(ts.get_string("b").unwrap(), format!("rec{}", a));
                count += 1;
            }
            assert_eq!(count, 50);
            ts.close();
        }
        tx.commit().expect("commit");
    }

    #[test]
    fn test_delete_removes_records_from_the_scan() {
        let db = open_db("ts_delete");
        let mut tx = db.new_tx().expect("tx");
        {
            let mut ts = TableScan::new(&mut tx, "t", test_layout()).expect("scan");
            for i in 0..30 {
                ts.insert().expect("insert");
                ts.set_int("a", i).expect("set a");
                ts.set_string("b", "x").expect("set b");
            }

            // delete the even records
            ts.before_first().expect("before first");
            while ts.next().expect("next") {
                if ts.get_int("a").expect("get a") % 2 == 0 {
                    ts.delete().expect("delete");
                }
            }

            ts.before_first().expect("before first");
            let mut remaining = 0;
            while ts.next().expect("next") {
                assert_eq!(ts.get_int("a").unwrap() % 2, 1);
                remaining += 1;
            }
            assert_eq!(remaining, 15);
            ts.close();
        }
        tx.commit().expect("commit");
    }

    #[test]
    fn test_rid_roundtrip() {
        let db = open_db("ts_rid");
        let mut tx = db.new_tx().expect("tx");
        {
            let mut ts = TableScan::new(&mut tx, "t", test_layout()).expect("scan");
            let mut rid_of_7 = None;
            for i in 0..20 {
                ts.insert().expect("insert");
                ts.set_int("a", i).expect("set a");
                ts.set_string("b", &format!("rec{}", i)).expect("set b");
                if i == 7 {
                    rid_of_7 = Some(ts.get_rid());
                }
            }

            ts.move_to_rid(rid_of_7.expect("rid recorded")).expect("move");
            assert_eq!(ts.get_int("a").unwrap(), 7);
            assert_eq!(ts.get_string("b").unwrap(), "rec7");
            ts.close();
        }
        tx.commit().expect("commit");
    }

    #[test]
    fn test_get_val_dispatches_on_field_type() {
        let db = open_db("ts_val");
        let mut tx = db.new_tx().expect("tx");
        {
            let mut ts = TableScan::new(&mut tx, "t", test_layout()).expect("scan");
            ts.insert().expect("insert");
            ts.set_val("a", &Constant::Int(12)).expect("set a");
            ts.set_val("b", &Constant::Str("twelve".to_string())).expect("set b");

            assert_eq!(ts.get_val("a").unwrap(), Constant::Int(12));
            assert_eq!(ts.get_val("b").unwrap(), Constant::Str("twelve".to_string()));
            assert!(ts.get_val("nope").is_err());
            assert!(ts.has_field("a"));
            assert!(!ts.has_field("nope"));
            ts.close();
        }
        tx.commit().expect("commit");
    }
}
