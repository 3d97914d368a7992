use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// A licensed animal hospital, keyed by its management number.
///
/// Field names follow the `seoul_pet_clinics` columns; the feed delivers the
/// same fields as upper-case keys without underscores (`MGTNO`, `BPLCNM`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PetClinic {
    /// Management number, the natural key.
    pub mgt_no: String,
    /// Code of the local government that published the record.
    pub opnsfteamcode: Option<String>,
    pub apv_perm_ymd: Option<String>,
    pub apv_cancel_ymd: Option<String>,
    pub trd_state_gbn: Option<String>,
    pub trd_state_nm: Option<String>,
    pub dtl_state_gbn: Option<String>,
    pub dtl_state_nm: Option<String>,
    pub dcby_md: Option<String>,
    pub clg_st_dt: Option<String>,
    pub clg_end_dt: Option<String>,
    pub ropn_ymd: Option<String>,
    pub site_tel: Option<String>,
    pub site_area: Option<String>,
    pub site_post_no: Option<String>,
    pub site_whl_addr: Option<String>,
    pub rdn_whl_addr: Option<String>,
    pub rdn_post_no: Option<String>,
    /// Business name.
    pub bplc_nm: Option<String>,
    pub last_mod_ts: Option<String>,
    pub update_gbn: Option<String>,
    pub update_dt: Option<String>,
    pub uptae_nm: Option<String>,
    /// X coordinate (EPSG:2097).
    pub x: Option<f64>,
    /// Y coordinate (EPSG:2097).
    pub y: Option<f64>,
    pub lind_job_gbn_nm: Option<String>,
    pub lind_prcb_gbn_nm: Option<String>,
    pub lind_seq_no: Option<String>,
    pub rgtmbds_no: Option<String>,
    pub totep_num: Option<String>,
}

impl PetClinic {
    /// Maps one `row` entry of the feed.
    ///
    /// Returns `None` when the management number is missing or blank, since
    /// such a row cannot be upserted. Coordinates that are absent or do not
    /// parse become `None`.
    pub fn from_feed_row(row: &Map<String, Value>) -> Option<Self> {
        let mgt_no = text(row, "MGTNO").filter(|s| !s.trim().is_empty())?;

        Some(Self {
            mgt_no,
            opnsfteamcode: text(row, "OPNSFTEAMCODE"),
            apv_perm_ymd: text(row, "APVPERMYMD"),
            apv_cancel_ymd: text(row, "APVCANCELYMD"),
            trd_state_gbn: text(row, "TRDSTATEGBN"),
            trd_state_nm: text(row, "TRDSTATENM"),
            dtl_state_gbn: text(row, "DTLSTATEGBN"),
            dtl_state_nm: text(row, "DTLSTATENM"),
            dcby_md: text(row, "DCBYMD"),
            clg_st_dt: text(row, "CLGSTDT"),
            clg_end_dt: text(row, "CLGENDDT"),
            ropn_ymd: text(row, "ROPNYMD"),
            site_tel: text(row, "SITETEL"),
            site_area: text(row, "SITEAREA"),
            site_post_no: text(row, "SITEPOSTNO"),
            site_whl_addr: text(row, "SITEWHLADDR"),
            rdn_whl_addr: text(row, "RDNWHLADDR"),
            rdn_post_no: text(row, "RDNPOSTNO"),
            bplc_nm: text(row, "BPLCNM"),
            last_mod_ts: text(row, "LASTMODTS"),
            update_gbn: text(row, "UPDATEGBN"),
            update_dt: text(row, "UPDATEDT"),
            uptae_nm: text(row, "UPTAENM"),
            x: coordinate(row, "X"),
            y: coordinate(row, "Y"),
            lind_job_gbn_nm: text(row, "LINDJOBGBNNM"),
            lind_prcb_gbn_nm: text(row, "LINDPRCBGBNNM"),
            lind_seq_no: text(row, "LINDSEQNO"),
            rgtmbds_no: text(row, "RGTMBDSNO"),
            totep_num: text(row, "TOTEPNUM"),
        })
    }
}

fn text(row: &Map<String, Value>, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn coordinate(row: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match row.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}
