use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use futures::StreamExt;
use scylla::{
    client::caching_session::CachingSession,
    response::query_result::QueryResult,
    serialize::row::SerializeRow,
    statement::{unprepared::Statement as CqlStatement, Consistency},
    value::{CqlValue, Row as CqlRow},
};
use tracing::debug;

use super::{
    convert::{to_cql, to_row},
    ConnectionParams,
};
use crate::{
    engine::{Engine, EngineRequest, EngineRows},
    Error, Parameters, Placeholder, Result, Row, ScanConsistency,
};

const KEYSPACE_QUERY: &str = "SELECT keyspace_name FROM system_schema.keyspaces WHERE keyspace_name = ?;";

/// [`Engine`] backed by a ScyllaDB caching session.
///
/// Statements are prepared once and cached by the session. `$n` placeholders
/// are sent as `?` markers with values reordered to their occurrence, `$name`
/// placeholders as `:name` markers.
#[derive(Debug, Clone)]
pub struct ScyllaEngine {
    session: Arc<CachingSession>,
}

enum Bound {
    Unset,
    Positional(Vec<Option<CqlValue>>),
    Named(HashMap<String, Option<CqlValue>>),
}

impl ScyllaEngine {
    pub async fn connect(params: &ConnectionParams) -> Result<Self> {
        debug!("Connecting to {}", params.uri);

        let session = params.caching().await?;

        Ok(Self::from_session(Arc::new(session)))
    }

    pub fn from_session(session: Arc<CachingSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> Arc<CachingSession> {
        self.session.clone()
    }

    async fn execute_unpaged(
        &self,
        statement: CqlStatement,
        values: impl SerializeRow,
    ) -> Result<QueryResult> {
        Ok(self.session.execute_unpaged(statement, values).await?)
    }

    async fn execute_iter(
        &self,
        statement: CqlStatement,
        values: impl SerializeRow,
    ) -> Result<EngineRows> {
        let pager = self.session.execute_iter(statement, values).await?;
        let names = column_names(pager.column_specs().iter().map(|spec| spec.name()));

        let rows = pager
            .rows_stream::<CqlRow>()?
            .map(move |row| row.map(|row| to_row(&names, row)).map_err(Error::from));

        Ok(rows.boxed())
    }
}

fn column_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    names.map(str::to_string).collect()
}

fn consistency(consistency: ScanConsistency) -> Consistency {
    match consistency {
        ScanConsistency::NotBounded => Consistency::LocalOne,
        ScanConsistency::RequestPlus => Consistency::All,
    }
}

fn statement(request: &EngineRequest) -> Result<CqlStatement> {
    let text = request.statement.render(|placeholder| match placeholder {
        Placeholder::Positional(_) => "?".to_string(),
        Placeholder::Named(name) => format!(":{name}"),
    });

    let mut statement = CqlStatement::new(text);
    statement.set_consistency(consistency(request.consistency));
    statement.set_request_timeout(request.timeout);
    match request.page_size {
        Some(page_size) if page_size < 1 => {
            return Err(Error::InvalidOption(format!(
                "page size must be at least 1, got {page_size}"
            )));
        }
        Some(page_size) => statement.set_page_size(page_size),
        None => {}
    }

    Ok(statement)
}

fn bind(request: &EngineRequest) -> Result<Bound> {
    let bound = match &request.parameters {
        Parameters::None => Bound::Unset,
        Parameters::Positional(_) => Bound::Positional(
            request
                .parameters
                .in_occurrence_order(&request.statement)
                .iter()
                .map(to_cql)
                .collect::<Result<_>>()?,
        ),
        Parameters::Named(values) => Bound::Named(
            values
                .iter()
                .map(|(name, value)| Ok((name.clone(), to_cql(value)?)))
                .collect::<Result<_>>()?,
        ),
    };

    Ok(bound)
}

#[async_trait]
impl Engine for ScyllaEngine {
    async fn bucket_exists(&self, name: &str) -> Result<bool> {
        let res = self.session.execute_unpaged(KEYSPACE_QUERY, (name,)).await?;

        let found = res
            .into_rows_result()?
            .rows::<(String,)>()?
            .filter_map(|row| row.ok())
            .any(|(keyspace_name,)| keyspace_name == name);

        Ok(found)
    }

    async fn execute(&self, request: EngineRequest) -> Result<Vec<Row>> {
        let statement = statement(&request)?;

        let res = match bind(&request)? {
            Bound::Unset => self.execute_unpaged(statement, ()).await?,
            Bound::Positional(values) => self.execute_unpaged(statement, values).await?,
            Bound::Named(values) => self.execute_unpaged(statement, values).await?,
        };

        if !res.is_rows() {
            return Ok(Vec::new());
        }

        let rows_result = res.into_rows_result()?;
        let names = column_names(rows_result.column_specs().iter().map(|spec| spec.name()));

        let rows = rows_result
            .rows::<CqlRow>()?
            .map(|row| Ok(to_row(&names, row?)))
            .collect::<Result<Vec<Row>>>()?;

        Ok(rows)
    }

    async fn stream(&self, request: EngineRequest) -> Result<EngineRows> {
        let statement = statement(&request)?;

        match bind(&request)? {
            Bound::Unset => self.execute_iter(statement, ()).await,
            Bound::Positional(values) => self.execute_iter(statement, values).await,
            Bound::Named(values) => self.execute_iter(statement, values).await,
        }
    }

    async fn close(&self) {
        debug!("Closing session, released when the last handle drops");
    }
}
