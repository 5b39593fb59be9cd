use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use menuauth_auth::{AccessPolicy, Role, is_authorized, resolve_for_roles};
use menuauth_core::{NodeId, RoleId};
use menuauth_menu::{Node, NodeKind};

/// `groups` top-level groups, each with `pages` pages, each page with two actions.
fn wide_tree(groups: u128, pages: u128) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut next = 1u128;
    for g in 0..groups {
        let group_id = NodeId::from_u128(next);
        next += 1;
        nodes.push(Node::new(group_id, format!("group-{g}"), NodeKind::Group).with_order(g as i32));

        for p in 0..pages {
            let page_id = NodeId::from_u128(next);
            next += 1;
            nodes.push(
                Node::new(page_id, format!("page-{g}-{p}"), NodeKind::Page)
                    .with_parent(group_id)
                    .with_destination(format!("/g{g}/p{p}"))
                    .with_order(p as i32),
            );
            for verb in ["create", "delete"] {
                nodes.push(
                    Node::new(NodeId::from_u128(next), format!("{verb}-{g}-{p}"), NodeKind::Action)
                        .with_parent(page_id)
                        .with_permission_code(format!("g{g}:p{p}:{verb}")),
                );
                next += 1;
            }
        }
    }
    nodes
}

/// Grant every third action.
fn sparse_role(nodes: &[Node]) -> Role {
    let grants = nodes
        .iter()
        .filter(|n| n.kind.is_action())
        .step_by(3)
        .map(|n| n.id);
    Role::new(RoleId::new(), "editor").with_grants(grants)
}

fn bench_resolve(c: &mut Criterion) {
    let policy = AccessPolicy::default();
    let mut group = c.benchmark_group("resolve_for_roles");

    for (groups, pages) in [(10u128, 10u128), (50, 20), (100, 50)] {
        let nodes = wide_tree(groups, pages);
        let roles = [sparse_role(&nodes)];
        group.throughput(Throughput::Elements(nodes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(nodes.len()), &nodes, |b, nodes| {
            b.iter(|| resolve_for_roles(black_box(&roles), black_box(nodes), &policy));
        });
    }
    group.finish();
}

fn bench_check(c: &mut Criterion) {
    let policy = AccessPolicy::default();
    let nodes = wide_tree(100, 50);
    let roles = [sparse_role(&nodes)];

    c.bench_function("is_authorized/miss", |b| {
        b.iter(|| is_authorized(black_box(&["nowhere:none"]), &roles, &nodes, &policy));
    });
}

criterion_group!(benches, bench_resolve, bench_check);
criterion_main!(benches);
