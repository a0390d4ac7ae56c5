use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::research::{
    NewResearchLog as DomainNewResearchLog, Recommendation, ResearchLog as DomainResearchLog,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::research_logs)]
pub struct ResearchLog {
    pub id: i32,
    pub research_date: NaiveDate,
    /// JSON array of recommendations.
    pub recommendations: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::research_logs)]
pub struct NewResearchLog {
    pub research_date: NaiveDate,
    pub recommendations: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<ResearchLog> for DomainResearchLog {
    type Error = serde_json::Error;

    fn try_from(value: ResearchLog) -> Result<Self, Self::Error> {
        let recommendations: Vec<Recommendation> = serde_json::from_str(&value.recommendations)?;
        Ok(Self {
            id: value.id,
            research_date: value.research_date,
            recommendations,
            created_at: value.created_at,
        })
    }
}

impl TryFrom<&DomainNewResearchLog> for NewResearchLog {
    type Error = serde_json::Error;

    fn try_from(value: &DomainNewResearchLog) -> Result<Self, Self::Error> {
        Ok(Self {
            research_date: value.research_date,
            recommendations: serde_json::to_string(&value.recommendations)?,
            created_at: value.created_at,
        })
    }
}
