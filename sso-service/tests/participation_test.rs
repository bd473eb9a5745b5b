//! Required-authentication-handlers SSO participation decisions.

mod common;

use common::{registered_service, FlakyServiceRegistry};
use sso_service::{
    models::{
        Authentication, AuthenticationPolicy, ExpirationPolicy, RegisteredService, Service,
        TicketGrantingTicket,
    },
    services::{
        AuthenticationServiceSelectionPlan, DefaultTicketRegistry, InMemoryServiceRegistry,
        ServicesManager, TicketRegistry, TicketRegistrySupport,
    },
    webflow::{
        RequestContext, RequiredAuthenticationHandlersParticipationStrategy,
        SingleSignOnParticipationStrategy,
    },
};
use std::sync::Arc;

const SIMPLE_HANDLER: &str = "SimpleTestUsernamePasswordAuthenticationHandler";

async fn services_manager(service: RegisteredService) -> ServicesManager {
    let manager = ServicesManager::new(Arc::new(InMemoryServiceRegistry::new(vec![service])));
    manager.load().await.expect("Failed to load services");
    manager
}

fn strategy(
    manager: ServicesManager,
    tickets: &DefaultTicketRegistry,
) -> RequiredAuthenticationHandlersParticipationStrategy {
    RequiredAuthenticationHandlersParticipationStrategy::new(
        manager,
        AuthenticationServiceSelectionPlan::default(),
        TicketRegistrySupport::new(Arc::new(tickets.clone())),
    )
}

async fn add_ticket(tickets: &DefaultTicketRegistry, handlers: &[&str]) -> String {
    let mut authentication = Authentication::new("casuser");
    for handler in handlers {
        authentication.add_success(*handler);
    }
    let tgt = TicketGrantingTicket::new(authentication, ExpirationPolicy::default());
    let id = tgt.id.clone();
    tickets.add_ticket(tgt).await.unwrap();
    id
}

#[tokio::test]
async fn missing_inputs_allow_participation() {
    let tickets = DefaultTicketRegistry::new();
    let svc = registered_service(1, "serviceid1")
        .with_authentication_policy(AuthenticationPolicy::requiring(["Handler1"]));
    let strategy = strategy(services_manager(svc).await, &tickets);

    let mut ctx = RequestContext::new();
    assert!(strategy.is_participating(&ctx).await);

    // Service present, ticket id absent
    ctx.put_service_into_flow_scope(Service::new("serviceid1"));
    assert!(strategy.is_participating(&ctx).await);
    assert!(!strategy.supports(&ctx));
}

#[tokio::test]
async fn supports_requires_service_and_ticket() {
    let tickets = DefaultTicketRegistry::new();
    let strategy = strategy(
        services_manager(registered_service(1, "serviceid1")).await,
        &tickets,
    );

    let mut ctx = RequestContext::new();
    assert!(!strategy.supports(&ctx));

    ctx.put_service_into_flow_scope(Service::new("serviceid1"));
    assert!(!strategy.supports(&ctx));
    assert_eq!(strategy.order(), 0);

    let mut ticket_only = RequestContext::new();
    ticket_only.put_ticket_granting_ticket_in_scopes("TGT-1");
    assert!(!strategy.supports(&ticket_only));
    assert!(strategy.is_participating(&ticket_only).await);

    // Independent of whether the ticket exists or what the policy says
    ctx.put_ticket_granting_ticket_in_scopes("TGT-does-not-exist");
    assert!(strategy.supports(&ctx));
}

#[tokio::test]
async fn mismatched_handlers_deny_participation() {
    let tickets = DefaultTicketRegistry::new();
    let svc = registered_service(1, "serviceid1")
        .with_authentication_policy(AuthenticationPolicy::requiring(["SomeOtherHandler"]));
    let strategy = strategy(services_manager(svc).await, &tickets);

    let mut ctx = RequestContext::new();
    ctx.put_service_into_flow_scope(Service::new("serviceid1"));
    ctx.put_ticket_granting_ticket_in_scopes(add_ticket(&tickets, &[SIMPLE_HANDLER]).await);

    assert!(strategy.supports(&ctx));
    assert!(!strategy.is_participating(&ctx).await);
}

#[tokio::test]
async fn required_handler_without_recorded_successes_denies() {
    let tickets = DefaultTicketRegistry::new();
    let svc = registered_service(1, "serviceid1")
        .with_authentication_policy(AuthenticationPolicy::requiring(["Handler1"]));
    let strategy = strategy(services_manager(svc).await, &tickets);

    let mut ctx = RequestContext::new();
    ctx.put_service_into_flow_scope(Service::new("serviceid1"));
    ctx.put_ticket_granting_ticket_in_scopes(add_ticket(&tickets, &[]).await);

    assert!(!strategy.is_participating(&ctx).await);
}

#[tokio::test]
async fn matching_handlers_allow_participation() {
    let tickets = DefaultTicketRegistry::new();
    let svc = registered_service(1, "serviceid1")
        .with_authentication_policy(AuthenticationPolicy::requiring([SIMPLE_HANDLER]));
    let strategy = strategy(services_manager(svc).await, &tickets);

    let mut ctx = RequestContext::new();
    ctx.put_service_into_flow_scope(Service::new("serviceid1"));
    ctx.put_ticket_granting_ticket_in_scopes(add_ticket(&tickets, &[SIMPLE_HANDLER]).await);

    assert!(strategy.supports(&ctx));
    assert!(strategy.is_participating(&ctx).await);
}

#[tokio::test]
async fn no_policy_allows_participation_with_empty_record() {
    let tickets = DefaultTicketRegistry::new();
    let strategy = strategy(
        services_manager(registered_service(1, "serviceid1")).await,
        &tickets,
    );

    let mut ctx = RequestContext::new();
    ctx.put_service_into_flow_scope(Service::new("serviceid1"));
    ctx.put_ticket_granting_ticket_in_scopes(add_ticket(&tickets, &[]).await);

    assert!(strategy.is_participating(&ctx).await);
}

#[tokio::test]
async fn expired_ticket_denies_when_policy_requires_handlers() {
    let tickets = DefaultTicketRegistry::new();
    let svc = registered_service(1, "serviceid1")
        .with_authentication_policy(AuthenticationPolicy::requiring([SIMPLE_HANDLER]));
    let strategy = strategy(services_manager(svc).await, &tickets);

    let mut tgt = TicketGrantingTicket::new(
        Authentication::new("casuser").with_success(SIMPLE_HANDLER),
        ExpirationPolicy::default(),
    );
    tgt.mark_expired();
    let id = tgt.id.clone();
    tickets.add_ticket(tgt).await.unwrap();

    let mut ctx = RequestContext::new();
    ctx.put_service_into_flow_scope(Service::new("serviceid1"));
    ctx.put_ticket_granting_ticket_in_scopes(id);

    assert!(!strategy.is_participating(&ctx).await);
}

#[tokio::test]
async fn step_up_within_session_satisfies_policy() {
    let tickets = DefaultTicketRegistry::new();
    let svc = registered_service(1, "serviceid1")
        .with_authentication_policy(AuthenticationPolicy::requiring(["Password", "Otp"]));
    let strategy = strategy(services_manager(svc).await, &tickets);

    let id = add_ticket(&tickets, &["Password"]).await;
    let mut ctx = RequestContext::new();
    ctx.put_service_into_flow_scope(Service::new("serviceid1"));
    ctx.put_ticket_granting_ticket_in_scopes(id.clone());
    assert!(!strategy.is_participating(&ctx).await);

    let mut tgt = tickets.get_ticket(&id).await.unwrap().unwrap();
    tgt.authentication.add_success("Otp");
    tickets.update_ticket(tgt).await.unwrap();

    assert!(strategy.is_participating(&ctx).await);
}

#[tokio::test]
async fn decision_does_not_reload_services() {
    let registry = Arc::new(FlakyServiceRegistry::new(vec![registered_service(
        1,
        "serviceid1",
    )
    .with_authentication_policy(AuthenticationPolicy::requiring(["Handler1"]))]));
    let manager = ServicesManager::new(registry.clone());
    manager.load().await.unwrap();
    registry.set_failing(true);

    let tickets = DefaultTicketRegistry::new();
    let strategy = strategy(manager, &tickets);
    let mut ctx = RequestContext::new();
    ctx.put_service_into_flow_scope(Service::new("serviceid1"));
    ctx.put_ticket_granting_ticket_in_scopes(add_ticket(&tickets, &["Handler1"]).await);

    assert!(strategy.is_participating(&ctx).await);
}
