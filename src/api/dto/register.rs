/*
 * Responsibility
 * - GET /documents/register の query 解釈と response 形
 *
 * Query
 * - lastModified: `<op><date>` を 1..=10 個 (同じ key の繰り返し)。op は eq/gt/ge/lt/le、省略時 eq
 * - page:    1 以上 (default 1)
 * - perPage: 1..=100 (default 1)
 *
 * serde_urlencoded は同じ key の繰り返しを Vec に集められないため、
 * ここでは url::form_urlencoded で自前に走査する。
 */
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::dto::parse_datetime;
use crate::repos::document_register_repo::{CompareOp, ModifiedFilter, RegisterRow};

const MAX_LAST_MODIFIED: usize = 10;
const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterQuery {
    pub filters: Vec<ModifiedFilter>,
    pub page: i64,
    pub per_page: i64,
}

impl RegisterQuery {
    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        let mut filters = Vec::new();
        let mut page = None;
        let mut per_page = None;

        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or("").as_bytes()) {
            match key.as_ref() {
                "lastModified" => filters.push(parse_last_modified(&value)?),
                "page" => page = Some(parse_bounded("page", &value, 1, i64::MAX)?),
                "perPage" => per_page = Some(parse_bounded("perPage", &value, 1, MAX_PER_PAGE)?),
                other => return Err(format!("querystring must NOT have additional property '{other}'")),
            }
        }

        if filters.is_empty() {
            return Err("querystring must have required property 'lastModified'".to_string());
        }
        if filters.len() > MAX_LAST_MODIFIED {
            return Err(format!(
                "querystring/lastModified must NOT have more than {MAX_LAST_MODIFIED} items"
            ));
        }

        Ok(Self {
            filters,
            page: page.unwrap_or(1),
            per_page: per_page.unwrap_or(1),
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

fn parse_last_modified(value: &str) -> Result<ModifiedFilter, String> {
    let (op, date) = match value.get(..2) {
        Some("eq") => (CompareOp::Eq, &value[2..]),
        Some("gt") => (CompareOp::Gt, &value[2..]),
        Some("ge") => (CompareOp::Ge, &value[2..]),
        Some("lt") => (CompareOp::Lt, &value[2..]),
        Some("le") => (CompareOp::Le, &value[2..]),
        _ => (CompareOp::Eq, value),
    };

    let at = parse_datetime(date)
        .ok_or_else(|| format!("querystring/lastModified '{value}' is not a valid date"))?;

    Ok(ModifiedFilter { op, at })
}

fn parse_bounded(name: &str, value: &str, min: i64, max: i64) -> Result<i64, String> {
    match value.parse::<i64>() {
        Ok(n) if (min..=max).contains(&n) => Ok(n),
        _ if max == i64::MAX => Err(format!("querystring/{name} must be an integer >= {min}")),
        _ => Err(format!("querystring/{name} must be an integer between {min} and {max}")),
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterEntry {
    pub guid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fhir_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
}

impl From<RegisterRow> for RegisterEntry {
    fn from(r: RegisterRow) -> Self {
        Self {
            guid: r.guid,
            fhir_id: r.fhir_id,
            title: r.title,
            clinic: r.clinic,
            document_type: r.document_type,
            specialty: r.specialty,
            created: r.created,
            modified: r.modified,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub total: i64,
    pub per_page: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct RegisterMeta {
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub data: Vec<RegisterEntry>,
    pub meta: RegisterMeta,
}

impl RegisterResponse {
    pub fn new(rows: Vec<RegisterRow>, total: i64, query: &RegisterQuery) -> Self {
        Self {
            data: rows.into_iter().map(RegisterEntry::from).collect(),
            meta: RegisterMeta {
                pagination: Pagination {
                    total,
                    per_page: query.per_page,
                    current_page: query.page,
                    total_pages: (total + query.per_page - 1) / query.per_page,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn defaults_and_operators() {
        let q = RegisterQuery::parse(Some(
            "lastModified=gt2021-01-01&lastModified=le2021-02-01T12%3A00%3A00Z",
        ))
        .unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, 1);
        assert_eq!(q.offset(), 0);
        assert_eq!(
            q.filters,
            vec![
                ModifiedFilter {
                    op: CompareOp::Gt,
                    at: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
                },
                ModifiedFilter {
                    op: CompareOp::Le,
                    at: Utc.with_ymd_and_hms(2021, 2, 1, 12, 0, 0).unwrap(),
                },
            ]
        );
    }

    #[test]
    fn bare_date_means_eq() {
        let q = RegisterQuery::parse(Some("lastModified=2021-01-01&page=3&perPage=20")).unwrap();
        assert_eq!(q.filters[0].op, CompareOp::Eq);
        assert_eq!(q.offset(), 40);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(RegisterQuery::parse(None).is_err());
        assert!(RegisterQuery::parse(Some("page=1")).is_err());
        assert!(RegisterQuery::parse(Some("lastModified=xx2021-01-01")).is_err());
        assert!(RegisterQuery::parse(Some("lastModified=2021-01-01&page=0")).is_err());
        assert!(RegisterQuery::parse(Some("lastModified=2021-01-01&perPage=101")).is_err());
        assert!(RegisterQuery::parse(Some("lastModified=2021-01-01&sort=title")).is_err());
        assert!(RegisterQuery::parse(Some("lastModified=2021-01-01%27%3B%20DROP%20TABLE%20x")).is_err());

        let eleven = vec!["lastModified=2021-01-01"; 11].join("&");
        assert!(RegisterQuery::parse(Some(&eleven)).is_err());
    }

    #[test]
    fn pagination_rounds_up_and_nulls_are_omitted() {
        let q = RegisterQuery::parse(Some("lastModified=2021-01-01&perPage=2")).unwrap();
        let row = RegisterRow {
            guid: "EFE4F61C-5BF7-4A5A-8B4E-9E8D9C6C9F0D".to_string(),
            fhir_id: None,
            title: Some("Discharge letter".to_string()),
            clinic: None,
            document_type: None,
            specialty: None,
            created: None,
            modified: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
        };
        let res = RegisterResponse::new(vec![row], 3, &q);
        assert_eq!(
            res.meta.pagination,
            Pagination {
                total: 3,
                per_page: 2,
                current_page: 1,
                total_pages: 2
            }
        );

        let json = serde_json::to_value(&res).unwrap();
        let entry = json["data"][0].as_object().unwrap();
        assert!(entry.contains_key("title"));
        assert!(!entry.contains_key("fhir_id"));
        assert!(!entry.contains_key("created"));
    }
}
