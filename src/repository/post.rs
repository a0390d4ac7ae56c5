use diesel::prelude::*;

use crate::{
    domain::post::{NewPostLog as DomainNewPostLog, PostLog as DomainPostLog},
    models::post::{NewPostLog as DbNewPostLog, PostLog as DbPostLog},
    repository::{DieselRepository, PostLogReader, PostLogWriter, RepositoryResult},
};

impl PostLogReader for DieselRepository {
    fn list_recent_posts(&self, limit: usize) -> RepositoryResult<Vec<DomainPostLog>> {
        use crate::schema::posts;

        let mut conn = self.conn()?;
        let rows = posts::table
            .select(DbPostLog::as_select())
            .order((posts::posted_at.desc(), posts::id.desc()))
            .limit(limit as i64)
            .load::<DbPostLog>(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

impl PostLogWriter for DieselRepository {
    fn append_post_log(&self, entry: &DomainNewPostLog) -> RepositoryResult<DomainPostLog> {
        use crate::schema::posts;

        let mut conn = self.conn()?;
        let db_new = DbNewPostLog::from(entry);

        let created = diesel::insert_into(posts::table)
            .values(&db_new)
            .get_result::<DbPostLog>(&mut conn)?;

        Ok(created.into())
    }
}
