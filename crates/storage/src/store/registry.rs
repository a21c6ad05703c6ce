#![forbid(unsafe_code)]

//! Activity and beneficiary rows owned by collaborating workflows, plus the
//! enrollment relation between them. Deletes cascade to every link row.

use super::{
    EnrollmentRequest, Queries, RegisterActivityRequest, RegisterBeneficiaryRequest, SqliteStore,
    StoreError, now_ms, row_id,
};
use lf_core::ids::{ActivityId, BeneficiaryId};
use lf_core::model::{Activity, Beneficiary, normalize_name};
use rusqlite::{Row, TransactionBehavior, params};
use tracing::{debug, info};

impl SqliteStore {
    pub fn register_activity(
        &mut self,
        request: RegisterActivityRequest,
    ) -> Result<Activity, StoreError> {
        let name = registry_name(&request.name)?;
        self.conn.execute(
            "INSERT INTO activities(name, created_at_ms) VALUES (?1, ?2)",
            params![name, now_ms()],
        )?;
        let id = row_id(self.conn.last_insert_rowid(), ActivityId::try_new)?;
        debug!(activity_id = %id, "activity registered");
        Ok(Activity { id, name })
    }

    pub fn delete_activity(&mut self, id: ActivityId) -> Result<(), StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !activity_exists(&Queries::new(&tx, &self.statements), id)? {
            return Err(StoreError::not_found("activity", id));
        }
        tx.execute("DELETE FROM activities WHERE id=?1", params![id.get()])?;
        tx.commit()?;
        info!(activity_id = %id, "activity deleted");
        Ok(())
    }

    pub fn get_activity(&self, id: ActivityId) -> Result<Activity, StoreError> {
        self.queries().first_row(
            "SELECT id, name FROM activities WHERE id=?1",
            params![id.get()],
            activity_from_row,
        )?
        .ok_or_else(|| StoreError::not_found("activity", id))
    }

    pub fn activity_exists(&self, id: ActivityId) -> Result<bool, StoreError> {
        activity_exists(&self.queries(), id)
    }

    pub fn register_beneficiary(
        &mut self,
        request: RegisterBeneficiaryRequest,
    ) -> Result<Beneficiary, StoreError> {
        let name = registry_name(&request.name)?;
        self.conn.execute(
            "INSERT INTO beneficiaries(name, created_at_ms) VALUES (?1, ?2)",
            params![name, now_ms()],
        )?;
        let id = row_id(self.conn.last_insert_rowid(), BeneficiaryId::try_new)?;
        debug!(beneficiary_id = %id, "beneficiary registered");
        Ok(Beneficiary { id, name })
    }

    pub fn delete_beneficiary(&mut self, id: BeneficiaryId) -> Result<(), StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !beneficiary_exists(&Queries::new(&tx, &self.statements), id)? {
            return Err(StoreError::not_found("beneficiary", id));
        }
        tx.execute("DELETE FROM beneficiaries WHERE id=?1", params![id.get()])?;
        tx.commit()?;
        info!(beneficiary_id = %id, "beneficiary deleted");
        Ok(())
    }

    pub fn get_beneficiary(&self, id: BeneficiaryId) -> Result<Beneficiary, StoreError> {
        self.queries().first_row(
            "SELECT id, name FROM beneficiaries WHERE id=?1",
            params![id.get()],
            beneficiary_from_row,
        )?
        .ok_or_else(|| StoreError::not_found("beneficiary", id))
    }

    pub fn beneficiary_exists(&self, id: BeneficiaryId) -> Result<bool, StoreError> {
        beneficiary_exists(&self.queries(), id)
    }

    /// Returns `false` when the beneficiary was already enrolled.
    pub fn enroll_beneficiary(&mut self, request: EnrollmentRequest) -> Result<bool, StoreError> {
        let EnrollmentRequest {
            activity_id,
            beneficiary_id,
        } = request;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let q = Queries::new(&tx, &self.statements);
        if !activity_exists(&q, activity_id)? {
            return Err(StoreError::missing_parent("activity", activity_id));
        }
        if !beneficiary_exists(&q, beneficiary_id)? {
            return Err(StoreError::missing_parent("beneficiary", beneficiary_id));
        }

        let inserted = tx.execute(
            "INSERT INTO activity_beneficiaries(activity_id, beneficiary_id, created_at_ms) \
             VALUES (?1, ?2, ?3) \
             ON CONFLICT(activity_id, beneficiary_id) DO NOTHING",
            params![activity_id.get(), beneficiary_id.get(), now_ms()],
        )?;
        tx.commit()?;

        debug!(%activity_id, %beneficiary_id, inserted = inserted == 1, "beneficiary enrolled");
        Ok(inserted == 1)
    }

    pub fn withdraw_beneficiary(&mut self, request: EnrollmentRequest) -> Result<(), StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM activity_beneficiaries WHERE activity_id=?1 AND beneficiary_id=?2",
            params![request.activity_id.get(), request.beneficiary_id.get()],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound(format!(
                "beneficiary {} is not enrolled in activity {}",
                request.beneficiary_id, request.activity_id
            )));
        }
        debug!(
            activity_id = %request.activity_id,
            beneficiary_id = %request.beneficiary_id,
            "beneficiary withdrawn"
        );
        Ok(())
    }
}

pub(super) fn activity_exists(q: &Queries<'_>, id: ActivityId) -> Result<bool, StoreError> {
    q.exists("SELECT 1 FROM activities WHERE id=?1", params![id.get()])
}

fn beneficiary_exists(q: &Queries<'_>, id: BeneficiaryId) -> Result<bool, StoreError> {
    q.exists("SELECT 1 FROM beneficiaries WHERE id=?1", params![id.get()])
}

pub(super) fn activity_from_row(row: &Row<'_>) -> Result<Activity, StoreError> {
    Ok(Activity {
        id: row_id(row.get(0)?, ActivityId::try_new)?,
        name: row.get(1)?,
    })
}

fn beneficiary_from_row(row: &Row<'_>) -> Result<Beneficiary, StoreError> {
    Ok(Beneficiary {
        id: row_id(row.get(0)?, BeneficiaryId::try_new)?,
        name: row.get(1)?,
    })
}

fn registry_name(value: &str) -> Result<String, StoreError> {
    normalize_name("name", value).map_err(|err| StoreError::Validation(err.message()))
}
