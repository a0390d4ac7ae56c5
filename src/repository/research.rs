use diesel::prelude::*;

use crate::{
    domain::research::{NewResearchLog as DomainNewResearchLog, ResearchLog as DomainResearchLog},
    models::research::{NewResearchLog as DbNewResearchLog, ResearchLog as DbResearchLog},
    repository::{
        DieselRepository, RepositoryError, RepositoryResult, ResearchLogReader, ResearchLogWriter,
    },
};

impl ResearchLogReader for DieselRepository {
    fn latest_research(&self) -> RepositoryResult<Option<DomainResearchLog>> {
        use crate::schema::research_logs;

        let mut conn = self.conn()?;
        let row = research_logs::table
            .select(DbResearchLog::as_select())
            .order((research_logs::created_at.desc(), research_logs::id.desc()))
            .first::<DbResearchLog>(&mut conn)
            .optional()?;

        row.map(DomainResearchLog::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }
}

impl ResearchLogWriter for DieselRepository {
    fn append_research_log(
        &self,
        entry: &DomainNewResearchLog,
    ) -> RepositoryResult<DomainResearchLog> {
        use crate::schema::research_logs;

        let mut conn = self.conn()?;
        let db_new = DbNewResearchLog::try_from(entry)?;

        let created = diesel::insert_into(research_logs::table)
            .values(&db_new)
            .get_result::<DbResearchLog>(&mut conn)?;

        Ok(created.try_into()?)
    }
}
