use log::debug;
use rusqlite::{Connection, named_params};
use serde_rusqlite::{from_rows, to_params_named};

use crate::db::error::DbResult;
use crate::models::PetClinic;

const CLINIC_COLUMNS: &str = "mgt_no, opnsfteamcode, apv_perm_ymd, apv_cancel_ymd, trd_state_gbn, trd_state_nm, \
     dtl_state_gbn, dtl_state_nm, dcby_md, clg_st_dt, clg_end_dt, ropn_ymd, site_tel, site_area, site_post_no, \
     site_whl_addr, rdn_whl_addr, rdn_post_no, bplc_nm, last_mod_ts, update_gbn, update_dt, uptae_nm, x, y, \
     lind_job_gbn_nm, lind_prcb_gbn_nm, lind_seq_no, rgtmbds_no, totep_num";

const UPSERT_CLINIC: &str = r#"
    INSERT INTO seoul_pet_clinics (
        mgt_no, opnsfteamcode, apv_perm_ymd, apv_cancel_ymd, trd_state_gbn, trd_state_nm,
        dtl_state_gbn, dtl_state_nm, dcby_md, clg_st_dt, clg_end_dt, ropn_ymd, site_tel,
        site_area, site_post_no, site_whl_addr, rdn_whl_addr, rdn_post_no, bplc_nm,
        last_mod_ts, update_gbn, update_dt, uptae_nm, x, y, lind_job_gbn_nm,
        lind_prcb_gbn_nm, lind_seq_no, rgtmbds_no, totep_num
    ) VALUES (
        :mgt_no, :opnsfteamcode, :apv_perm_ymd, :apv_cancel_ymd, :trd_state_gbn, :trd_state_nm,
        :dtl_state_gbn, :dtl_state_nm, :dcby_md, :clg_st_dt, :clg_end_dt, :ropn_ymd, :site_tel,
        :site_area, :site_post_no, :site_whl_addr, :rdn_whl_addr, :rdn_post_no, :bplc_nm,
        :last_mod_ts, :update_gbn, :update_dt, :uptae_nm, :x, :y, :lind_job_gbn_nm,
        :lind_prcb_gbn_nm, :lind_seq_no, :rgtmbds_no, :totep_num
    )
    ON CONFLICT(mgt_no) DO UPDATE SET
        opnsfteamcode = excluded.opnsfteamcode,
        apv_perm_ymd = excluded.apv_perm_ymd,
        apv_cancel_ymd = excluded.apv_cancel_ymd,
        trd_state_gbn = excluded.trd_state_gbn,
        trd_state_nm = excluded.trd_state_nm,
        dtl_state_gbn = excluded.dtl_state_gbn,
        dtl_state_nm = excluded.dtl_state_nm,
        dcby_md = excluded.dcby_md,
        clg_st_dt = excluded.clg_st_dt,
        clg_end_dt = excluded.clg_end_dt,
        ropn_ymd = excluded.ropn_ymd,
        site_tel = excluded.site_tel,
        site_area = excluded.site_area,
        site_post_no = excluded.site_post_no,
        site_whl_addr = excluded.site_whl_addr,
        rdn_whl_addr = excluded.rdn_whl_addr,
        rdn_post_no = excluded.rdn_post_no,
        bplc_nm = excluded.bplc_nm,
        last_mod_ts = excluded.last_mod_ts,
        update_gbn = excluded.update_gbn,
        update_dt = excluded.update_dt,
        uptae_nm = excluded.uptae_nm,
        x = excluded.x,
        y = excluded.y,
        lind_job_gbn_nm = excluded.lind_job_gbn_nm,
        lind_prcb_gbn_nm = excluded.lind_prcb_gbn_nm,
        lind_seq_no = excluded.lind_seq_no,
        rgtmbds_no = excluded.rgtmbds_no,
        totep_num = excluded.totep_num,
        updated_at = CURRENT_TIMESTAMP
"#;

/// Inserts the clinic, or overwrites every field of the existing row with the
/// same management number.
pub fn upsert_pet_clinic(conn: &Connection, clinic: &PetClinic) -> DbResult<()> {
    let params = to_params_named(clinic)?;
    let mut stmt = conn.prepare_cached(UPSERT_CLINIC)?;
    stmt.execute(params.to_slice().as_slice())?;
    Ok(())
}

/// Upserts a batch in a single transaction. Either every record lands or none does.
pub fn upsert_pet_clinics(conn: &mut Connection, clinics: &[PetClinic]) -> DbResult<usize> {
    debug!(count = clinics.len(); "DB: Upserting pet clinics");

    let tx = conn.transaction()?;
    for clinic in clinics {
        upsert_pet_clinic(&tx, clinic)?;
    }
    tx.commit()?;

    Ok(clinics.len())
}

pub fn get_pet_clinic(conn: &Connection, mgt_no: &str) -> DbResult<Option<PetClinic>> {
    let mut stmt =
        conn.prepare_cached(&format!("SELECT {CLINIC_COLUMNS} FROM seoul_pet_clinics WHERE mgt_no = :mgt_no"))?;
    let rows = stmt.query(named_params! { ":mgt_no": mgt_no })?;
    let clinic = from_rows::<PetClinic>(rows).next().transpose()?;
    Ok(clinic)
}

pub fn list_pet_clinics(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<PetClinic>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {CLINIC_COLUMNS} FROM seoul_pet_clinics ORDER BY mgt_no ASC LIMIT :limit OFFSET :offset"
    ))?;
    let rows = stmt.query(named_params! { ":limit": limit, ":offset": offset })?;
    let clinics = from_rows::<PetClinic>(rows).collect::<Result<Vec<_>, _>>()?;
    Ok(clinics)
}

pub fn count_pet_clinics(conn: &Connection) -> DbResult<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM seoul_pet_clinics", [], |row| row.get(0))?;
    Ok(count)
}
