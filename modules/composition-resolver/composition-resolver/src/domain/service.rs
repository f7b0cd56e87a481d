//! Domain service for the composition resolver.

use std::collections::{BTreeMap, HashMap};

use composition_resolver_sdk::{
    AccessGrant, CompositionResolverError, Context, ContextDetails, ResolutionResult,
    ResolvedSchedule, Resource, ResourceSpec, RouteTable, ScheduleSpec, Stack, StorageKind,
};
use stack_naming::{NamingError, PhysicalId, STACK_ID_ENV, env_key, normalize};
use tracing::{debug, info};

use super::permissions::{GrantTarget, action_table, synthesize};
use super::routing::{RoutingScope, build_route_table};
use super::schedule::translate;
use crate::config::CompositionResolverConfig;

/// Composition resolver service.
///
/// Holds configuration only; every call to [`Service::resolve`] starts from
/// scratch.
#[derive(Debug, Clone, Default)]
pub struct Service {
    config: CompositionResolverConfig,
}

impl Service {
    #[must_use]
    pub fn new(config: CompositionResolverConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &CompositionResolverConfig {
        &self.config
    }

    /// Resolve `stack` in three passes: identifiers, then grants, schedules
    /// and route tables per resource in declaration order, then contexts.
    ///
    /// # Errors
    ///
    /// The first structural error, naming the resource, entrypoint or
    /// schedule that caused it.
    #[tracing::instrument(skip_all, fields(stack = %stack.name, stack_id = %stack.stack_id))]
    pub fn resolve(&self, stack: &Stack) -> Result<ResolutionResult, CompositionResolverError> {
        let ids = assign_identifiers(stack)?;
        let physical_ids: BTreeMap<String, PhysicalId> = stack
            .resources
            .iter()
            .map(|resource| resource.name.clone())
            .zip(ids.iter().cloned())
            .collect();
        debug!(resources = ids.len(), "Identifiers assigned");

        let mut pass = ResolutionPass {
            stack,
            scope: RoutingScope {
                stack,
                physical_ids: &physical_ids,
                edge: &self.config.edge,
            },
            grants: Vec::new(),
            route_tables: BTreeMap::new(),
            schedules: BTreeMap::new(),
            schedule_ids: HashMap::new(),
        };
        let details = stack
            .resources
            .iter()
            .zip(&ids)
            .map(|(resource, physical_id)| pass.details(resource, physical_id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut contexts = BTreeMap::new();
        for ((resource, physical_id), mut resource_details) in
            stack.resources.iter().zip(ids).zip(details)
        {
            if let ContextDetails::Compute { environment, .. } = &mut resource_details {
                *environment = compute_environment(stack, &resource.name, &pass.grants)?;
            }
            contexts.insert(
                resource.name.clone(),
                Context {
                    name: resource.name.clone(),
                    physical_id,
                    tags: resource.tags.clone(),
                    exports: resource.exports.clone(),
                    details: resource_details,
                },
            );
        }

        info!(
            contexts = contexts.len(),
            grants = pass.grants.len(),
            route_tables = pass.route_tables.len(),
            schedules = pass.schedules.len(),
            "Stack resolved"
        );

        Ok(ResolutionResult {
            stack_name: stack.name.clone(),
            stack_id: stack.stack_id.clone(),
            contexts,
            grants: pass.grants,
            route_tables: pass.route_tables,
            schedules: pass.schedules,
        })
    }
}

/// Accumulated state of the per-resource pass.
struct ResolutionPass<'a> {
    stack: &'a Stack,
    scope: RoutingScope<'a>,
    grants: Vec<AccessGrant>,
    route_tables: BTreeMap<String, RouteTable>,
    schedules: BTreeMap<String, String>,
    schedule_ids: HashMap<PhysicalId, &'a str>,
}

impl<'a> ResolutionPass<'a> {
    fn details(
        &mut self,
        resource: &'a Resource,
        physical_id: &PhysicalId,
    ) -> Result<ContextDetails, CompositionResolverError> {
        match &resource.spec {
            ResourceSpec::Storage { engine, consumers } => {
                let grants = synthesize(
                    action_table(*engine),
                    GrantTarget {
                        name: &resource.name,
                        physical_id,
                    },
                    consumers,
                )
                .map_err(|e| CompositionResolverError::UnknownIntent {
                    resource: resource.name.clone(),
                    consumer: e.consumer,
                    intent: e.source.0,
                })?;
                debug!(resource = %resource.name, grants = grants.len(), "Grants synthesized");
                self.grants.extend(grants.iter().cloned());
                Ok(ContextDetails::Storage {
                    engine: *engine,
                    grants,
                })
            }
            ResourceSpec::Compute { schedules } => {
                let mut resolved = Vec::with_capacity(schedules.len());
                for schedule in schedules {
                    let translated = self.translate_schedule(schedule)?;
                    self.schedules
                        .insert(translated.name.clone(), translated.expression.clone());
                    resolved.push(translated);
                }
                Ok(ContextDetails::Compute {
                    schedules: resolved,
                    environment: BTreeMap::new(),
                })
            }
            ResourceSpec::Entrypoint { routes } => {
                let route_table = build_route_table(self.scope, &resource.name, physical_id, routes)
                    .map_err(|e| e.for_entrypoint(&resource.name))?;
                self.route_tables
                    .insert(resource.name.clone(), route_table.clone());
                Ok(ContextDetails::Entrypoint { route_table })
            }
        }
    }

    fn translate_schedule(
        &mut self,
        schedule: &'a ScheduleSpec,
    ) -> Result<ResolvedSchedule, CompositionResolverError> {
        let schedule_id = normalize_in(self.stack, &schedule.name)?;
        if let Some(first) = self
            .schedule_ids
            .insert(schedule_id.clone(), &schedule.name)
        {
            return Err(CompositionResolverError::NameCollision {
                first: first.to_owned(),
                second: schedule.name.clone(),
                physical_id: schedule_id.into_string(),
            });
        }

        let expression = translate(&schedule.cron_expression).map_err(|e| {
            CompositionResolverError::InvalidCronFormat {
                schedule: schedule.name.clone(),
                expression: schedule.cron_expression.clone(),
                fields: e.fields,
            }
        })?;
        debug!(schedule = %schedule.name, expression = %expression, "Schedule translated");

        Ok(ResolvedSchedule {
            name: schedule.name.clone(),
            schedule_id,
            expression,
            target_path: schedule.target_path.clone(),
        })
    }
}

fn invalid_name(owner: &str, name: &str, error: &NamingError) -> CompositionResolverError {
    CompositionResolverError::InvalidName {
        owner: owner.to_owned(),
        name: name.to_owned(),
        reason: error.to_string(),
    }
}

/// Normalize `name` within `stack`, blaming the stack itself for an empty id.
fn normalize_in(stack: &Stack, name: &str) -> Result<PhysicalId, CompositionResolverError> {
    normalize(&stack.stack_id, name).map_err(|e| match e {
        NamingError::EmptyStackId => invalid_name(&stack.name, &stack.stack_id, &e),
        _ => invalid_name(name, name, &e),
    })
}

fn assign_identifiers(stack: &Stack) -> Result<Vec<PhysicalId>, CompositionResolverError> {
    let mut owners: HashMap<PhysicalId, &str> = HashMap::new();
    let mut ids = Vec::with_capacity(stack.resources.len());

    for resource in &stack.resources {
        let physical_id = normalize_in(stack, &resource.name)?;
        if let Some(first) = owners.insert(physical_id.clone(), &resource.name) {
            return Err(CompositionResolverError::NameCollision {
                first: first.to_owned(),
                second: resource.name.clone(),
                physical_id: physical_id.into_string(),
            });
        }
        ids.push(physical_id);
    }

    Ok(ids)
}

/// `STACK_ID` plus one variable per storage resource `compute` holds a grant on.
fn compute_environment(
    stack: &Stack,
    compute: &str,
    grants: &[AccessGrant],
) -> Result<BTreeMap<String, String>, CompositionResolverError> {
    let mut environment = BTreeMap::from([(STACK_ID_ENV.to_owned(), stack.stack_id.clone())]);

    for grant in grants.iter().filter(|g| g.consumer_ref == compute) {
        let Some(ResourceSpec::Storage { engine, .. }) =
            stack.resource(&grant.resource_ref).map(|r| &r.spec)
        else {
            continue;
        };
        let key = storage_env_key(&grant.resource_ref, *engine)?;
        environment.insert(key, grant.resource_id.as_str().to_owned());
    }

    Ok(environment)
}

fn storage_env_key(storage: &str, engine: StorageKind) -> Result<String, CompositionResolverError> {
    env_key(storage, engine.env_suffix()).map_err(|e| invalid_name(storage, storage, &e))
}
